//! Delegation to a platform-managed disk-backed response cache.

use std::sync::Arc;

use crate::error::Result;
use crate::http::{HttpResponse, Request};

use super::Cache;

/// A platform-level response cache keyed by URL with a byte-size bound.
///
/// Freshness, revalidation and persistence are the platform's business;
/// the engine only signals it.
pub trait PlatformCache: Send + Sync {
    /// Persist any buffered responses.
    fn flush(&self);

    /// Drop every stored response and start over.
    fn reset(&self) -> Result<()>;
}

/// [`Cache`] variant that defers to a [`PlatformCache`].
///
/// `get` enables transport-level caching on the live connection and
/// reports a miss so the exchange always reaches the transport, where the
/// platform cache answers it. `put` flushes, `clear` resets.
pub struct DiskCache {
    platform: Arc<dyn PlatformCache>,
}

impl DiskCache {
    pub fn new(platform: Arc<dyn PlatformCache>) -> Self {
        Self { platform }
    }
}

impl Cache for DiskCache {
    fn get(&self, request: &Request) -> Option<HttpResponse> {
        request.connection(|conn| conn.set_use_caches(true));
        None
    }

    fn put(&self, _request: &Request, _response: &HttpResponse) {
        self.platform.flush();
    }

    fn clear(&self) -> Result<()> {
        self.platform.reset()
    }
}
