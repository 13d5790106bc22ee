//! Materialized HTTP response type.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};

/// A fully received HTTP response: status line, headers and body bytes.
///
/// One `HttpResponse` is produced per physical execution attempt. It is
/// immutable and cheap to clone, so the cache can hold onto it and hand
/// copies back to later requests.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    content_type: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Build a response from its received parts. The content type is
    /// extracted from the `Content-Type` header.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Self {
            status,
            content_type,
            headers,
            body,
        }
    }

    /// The status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response content type, when the origin provided one.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The full response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw body bytes. Also populated for non-2xx statuses so error
    /// bodies remain available for diagnostics.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
