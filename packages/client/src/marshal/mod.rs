//! Typed body values and the marshalling registry.
//!
//! Request and response bodies cross the engine as [`Body`] values. A
//! [`MarshalRegistry`] turns them into wire bytes (dispatching on the
//! value's variant) and back (dispatching on the response content type,
//! falling back to raw bytes when nothing matches).

mod defaults;
mod registry;

use bytes::Bytes;

pub use defaults::{BytesMarshaller, FormMarshaller, JsonMarshaller, TextMarshaller};
pub use registry::MarshalRegistry;

use crate::error::Result;

/// A typed body value.
///
/// JSON objects and arrays both inhabit [`Body::Json`].
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// JSON document.
    Json(serde_json::Value),
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// URL-encoded form fields, in insertion order. Outbound only.
    Form(Vec<(String, String)>),
}

impl Body {
    /// Serialize a value into a JSON body.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(crate::error::marshal)
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_owned())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

/// Marshalling failures raised by individual marshallers.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("no marshaller registered for this value")]
    UnsupportedValue,
    #[error("marshaller does not support inbound data")]
    UnsupportedInbound,
    #[error("body is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid form body: {0}")]
    InvalidForm(#[from] serde_urlencoded::ser::Error),
}

/// Transforms typed values to wire bytes and back.
///
/// Outbound dispatch is on the value itself (`accepts`); inbound dispatch
/// is on the response content type (`response_content_types`, matched by
/// case-insensitive containment).
pub trait Marshaller: Send + Sync {
    /// Serialize a body value to bytes.
    fn marshal(&self, body: &Body) -> Result<Bytes>;

    /// Deserialize response bytes into a body value.
    fn unmarshal(&self, content: &[u8]) -> Result<Body>;

    /// Content type stamped on outbound requests, or `None` when this
    /// marshaller is inbound-only.
    fn request_content_type(&self) -> Option<&'static str>;

    /// Response content types this marshaller decodes. Empty when the
    /// marshaller is outbound-only.
    fn response_content_types(&self) -> &'static [&'static str];

    /// Whether this marshaller serializes the given value.
    fn accepts(&self, body: &Body) -> bool;
}
