//! Transport SPI consumed by the execution engine.
//!
//! The engine never speaks TCP/TLS itself. It drives an opaque
//! [`Connection`] obtained from a [`Connector`], following the classic
//! open / configure / write / read sequence. Concrete transports live
//! outside this crate; tests inject mocks.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::error::Result;

/// Marshalled request body handed to the transport.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Content type reported by the marshaller, set as the request's
    /// `Content-Type` when present.
    pub content_type: Option<String>,
    /// Serialized body bytes.
    pub data: Bytes,
}

/// A single open exchange with an origin server.
///
/// Calls arrive in order: configuration (`set_timeout`, `set_use_caches`),
/// then `write`, then `status`/`headers`/`read`. Implementations block the
/// worker thread for up to the configured timeout.
pub trait Connection: Send {
    /// Apply the per-request timeout to connect, write and read.
    fn set_timeout(&mut self, timeout: Duration);

    /// Enable or disable transport-level response caching for this
    /// exchange. The disk-backed cache variant turns this on; the
    /// engine-managed cache turns it off.
    fn set_use_caches(&mut self, enabled: bool);

    /// Send the request line, headers and optional body.
    fn write(&mut self, method: &Method, headers: &HeaderMap, payload: Option<&Payload>)
    -> Result<()>;

    /// Read the response status code.
    fn status(&mut self) -> Result<StatusCode>;

    /// Read the response headers.
    fn headers(&mut self) -> Result<HeaderMap>;

    /// Read the full response body. Must also yield the body of non-2xx
    /// responses so it can be delivered for diagnostics.
    fn read(&mut self) -> Result<Bytes>;
}

/// Opaque transport security material (certificates, TLS configuration).
///
/// The pool carries at most one of these and hands it to the connector on
/// every open; concrete connectors downcast to their own type.
pub trait TransportSecurity: Any + Send + Sync {}

/// Factory for [`Connection`]s, selected at pool construction time.
pub trait Connector: Send + Sync {
    /// Open a connection for the given URL.
    fn connect(
        &self,
        url: &Url,
        security: Option<&Arc<dyn TransportSecurity>>,
    ) -> Result<Box<dyn Connection>>;
}

impl<T: Connector + ?Sized> Connector for Arc<T> {
    fn connect(
        &self,
        url: &Url,
        security: Option<&Arc<dyn TransportSecurity>>,
    ) -> Result<Box<dyn Connection>> {
        (**self).connect(url, security)
    }
}
