//! Stock marshallers registered by [`MarshalRegistry::new`].
//!
//! [`MarshalRegistry::new`]: super::MarshalRegistry::new

use bytes::Bytes;

use super::{Body, MarshalError, Marshaller};
use crate::error::{self, Result};

/// JSON documents, `application/json` in both directions.
#[derive(Debug, Default)]
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
    fn marshal(&self, body: &Body) -> Result<Bytes> {
        match body {
            Body::Json(value) => serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| error::marshal(MarshalError::InvalidJson(e))),
            _ => Err(error::marshal(MarshalError::UnsupportedValue)),
        }
    }

    fn unmarshal(&self, content: &[u8]) -> Result<Body> {
        serde_json::from_slice(content)
            .map(Body::Json)
            .map_err(|e| error::decode(MarshalError::InvalidJson(e)))
    }

    fn request_content_type(&self) -> Option<&'static str> {
        Some("application/json")
    }

    fn response_content_types(&self) -> &'static [&'static str] {
        &["application/json"]
    }

    fn accepts(&self, body: &Body) -> bool {
        matches!(body, Body::Json(_))
    }
}

/// Plain text, `text/plain` outbound, `text/plain` and `text/html` inbound.
#[derive(Debug, Default)]
pub struct TextMarshaller;

impl Marshaller for TextMarshaller {
    fn marshal(&self, body: &Body) -> Result<Bytes> {
        match body {
            Body::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            _ => Err(error::marshal(MarshalError::UnsupportedValue)),
        }
    }

    fn unmarshal(&self, content: &[u8]) -> Result<Body> {
        let text = std::str::from_utf8(content)
            .map_err(|e| error::decode(MarshalError::InvalidUtf8(e)))?;
        Ok(Body::Text(text.to_owned()))
    }

    fn request_content_type(&self) -> Option<&'static str> {
        Some("text/plain")
    }

    fn response_content_types(&self) -> &'static [&'static str] {
        &["text/plain", "text/html"]
    }

    fn accepts(&self, body: &Body) -> bool {
        matches!(body, Body::Text(_))
    }
}

/// Raw bytes, `application/octet-stream` in both directions.
#[derive(Debug, Default)]
pub struct BytesMarshaller;

impl Marshaller for BytesMarshaller {
    fn marshal(&self, body: &Body) -> Result<Bytes> {
        match body {
            Body::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(error::marshal(MarshalError::UnsupportedValue)),
        }
    }

    fn unmarshal(&self, content: &[u8]) -> Result<Body> {
        Ok(Body::Bytes(Bytes::copy_from_slice(content)))
    }

    fn request_content_type(&self) -> Option<&'static str> {
        Some("application/octet-stream")
    }

    fn response_content_types(&self) -> &'static [&'static str] {
        &["application/octet-stream"]
    }

    fn accepts(&self, body: &Body) -> bool {
        matches!(body, Body::Bytes(_))
    }
}

/// URL-encoded form fields, `application/x-www-form-urlencoded`.
/// Outbound only.
#[derive(Debug, Default)]
pub struct FormMarshaller;

impl Marshaller for FormMarshaller {
    fn marshal(&self, body: &Body) -> Result<Bytes> {
        match body {
            Body::Form(fields) => serde_urlencoded::to_string(fields)
                .map(Bytes::from)
                .map_err(|e| error::marshal(MarshalError::InvalidForm(e))),
            _ => Err(error::marshal(MarshalError::UnsupportedValue)),
        }
    }

    fn unmarshal(&self, _content: &[u8]) -> Result<Body> {
        Err(error::decode(MarshalError::UnsupportedInbound))
    }

    fn request_content_type(&self) -> Option<&'static str> {
        Some("application/x-www-form-urlencoded")
    }

    fn response_content_types(&self) -> &'static [&'static str] {
        &[]
    }

    fn accepts(&self, body: &Body) -> bool {
        matches!(body, Body::Form(_))
    }
}
