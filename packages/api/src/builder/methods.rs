//! Terminal HTTP methods; each submits the request and returns its
//! cancel handle.

use std::sync::Arc;

use restq_client::prelude::*;

use super::RestBuilder;

impl RestBuilder {
    /// Submit a GET request.
    pub fn get(self, url: &str) -> Result<Arc<Request>> {
        self.submit(Method::GET, url, None)
    }

    /// Submit a POST request carrying `body`.
    pub fn post(self, url: &str, body: impl Into<Body>) -> Result<Arc<Request>> {
        self.submit(Method::POST, url, Some(body.into()))
    }

    /// Submit a PUT request carrying `body`.
    pub fn put(self, url: &str, body: impl Into<Body>) -> Result<Arc<Request>> {
        self.submit(Method::PUT, url, Some(body.into()))
    }

    /// Submit a DELETE request.
    pub fn delete(self, url: &str) -> Result<Arc<Request>> {
        self.submit(Method::DELETE, url, None)
    }
}
