//! Injectable marshaller registry.

use std::sync::Arc;

use super::defaults::{BytesMarshaller, FormMarshaller, JsonMarshaller, TextMarshaller};
use super::{Body, MarshalError, Marshaller};
use crate::connect::Payload;
use crate::error::{self, Result};

/// Registry of [`Marshaller`]s, constructed explicitly and injected into a
/// pool. There is no process-wide instance.
pub struct MarshalRegistry {
    outbound: Vec<Arc<dyn Marshaller>>,
    inbound: Vec<(&'static str, Arc<dyn Marshaller>)>,
}

impl Default for MarshalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MarshalRegistry {
    /// Registry preloaded with the stock marshallers: JSON, plain text,
    /// raw bytes and URL-encoded forms.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(JsonMarshaller));
        registry.register(Arc::new(TextMarshaller));
        registry.register(Arc::new(BytesMarshaller));
        registry.register(Arc::new(FormMarshaller));
        registry
    }

    /// Registry with no marshallers at all.
    pub fn empty() -> Self {
        Self {
            outbound: Vec::new(),
            inbound: Vec::new(),
        }
    }

    /// Register a marshaller for outbound dispatch (when it reports a
    /// request content type) and for each of its response content types.
    pub fn register(&mut self, marshaller: Arc<dyn Marshaller>) {
        for content_type in marshaller.response_content_types() {
            self.inbound.push((content_type, marshaller.clone()));
        }
        if marshaller.request_content_type().is_some() {
            self.outbound.push(marshaller);
        }
    }

    /// Serialize a body value into a transport payload.
    ///
    /// Errors with [`Kind::Marshal`](crate::error::Kind::Marshal) when no
    /// registered marshaller accepts the value.
    pub fn marshal(&self, body: &Body) -> Result<Payload> {
        let marshaller = self
            .outbound
            .iter()
            .find(|m| m.accepts(body))
            .ok_or_else(|| error::marshal(MarshalError::UnsupportedValue))?;
        Ok(Payload {
            content_type: marshaller.request_content_type().map(str::to_owned),
            data: marshaller.marshal(body)?,
        })
    }

    /// Deserialize response bytes by content type.
    ///
    /// Every registered marshaller whose content-type key is contained in
    /// the response content type is tried in registration order; failures
    /// are skipped. When nothing matches or decodes, the raw bytes are
    /// returned as [`Body::Bytes`].
    pub fn unmarshal(&self, content_type: Option<&str>, data: &[u8]) -> Body {
        if let Some(content_type) = content_type {
            let content_type = content_type.to_ascii_lowercase();
            for (key, marshaller) in &self.inbound {
                if content_type.contains(key) {
                    match marshaller.unmarshal(data) {
                        Ok(body) => return body,
                        Err(e) => {
                            tracing::debug!(
                                target: "restq::marshal",
                                content_type = %content_type,
                                error = %e,
                                "registered marshaller failed, trying next"
                            );
                        }
                    }
                }
            }
        }
        Body::Bytes(bytes::Bytes::copy_from_slice(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_outbound_on_value_type() {
        let registry = MarshalRegistry::new();

        let payload = registry
            .marshal(&Body::Json(serde_json::json!({"a": 1})))
            .expect("json payload");
        assert_eq!(payload.content_type.as_deref(), Some("application/json"));

        let payload = registry
            .marshal(&Body::Form(vec![("a".into(), "1".into())]))
            .expect("form payload");
        assert_eq!(
            payload.content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn empty_registry_rejects_all_values() {
        let registry = MarshalRegistry::empty();
        let err = registry.marshal(&Body::Text("hi".into())).unwrap_err();
        assert!(matches!(err.kind(), crate::error::Kind::Marshal));
    }

    #[test]
    fn dispatches_inbound_on_content_type_containment() {
        let registry = MarshalRegistry::new();

        let body = registry.unmarshal(Some("application/json; charset=utf-8"), b"[1,2]");
        assert_eq!(body, Body::Json(serde_json::json!([1, 2])));

        let body = registry.unmarshal(Some("text/html"), b"<p>ok</p>");
        assert_eq!(body, Body::Text("<p>ok</p>".to_owned()));
    }

    #[test]
    fn falls_back_to_raw_bytes() {
        let registry = MarshalRegistry::new();

        // Unknown content type.
        let body = registry.unmarshal(Some("application/pdf"), b"%PDF");
        assert_eq!(body, Body::Bytes(bytes::Bytes::from_static(b"%PDF")));

        // No content type at all.
        let body = registry.unmarshal(None, b"raw");
        assert_eq!(body, Body::Bytes(bytes::Bytes::from_static(b"raw")));

        // Matching marshaller that fails to decode.
        let body = registry.unmarshal(Some("application/json"), b"not json");
        assert_eq!(body, Body::Bytes(bytes::Bytes::from_static(b"not json")));
    }
}
