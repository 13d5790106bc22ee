//! HTTP response caching: directives, entries, the validity engine and the
//! pluggable store backends.

mod cache_control;
mod cache_entry;
mod disk;
mod http_cache;
mod http_date;
mod lru;

pub use cache_control::CacheControl;
pub use cache_entry::CacheEntry;
pub use disk::{DiskCache, PlatformCache};
pub use http_cache::{CacheStore, HttpCache};
pub use http_date::{HttpDateParseError, httpdate};
pub use lru::LruStore;

use crate::error::Result;
use crate::http::{HttpResponse, Request};

/// The cache contract consumed by the execution engine.
///
/// Implementations are shared across all worker threads and must keep
/// every operation safe under concurrency.
pub trait Cache: Send + Sync {
    /// Look up a response for the request, applying whatever validity
    /// rules the backend implements. May mutate the request (conditional
    /// revalidation headers, transport cache signals) before the network
    /// call, which is why lookup runs in a pre-execution hook.
    fn get(&self, request: &Request) -> Option<HttpResponse>;

    /// Offer a received response for storage.
    fn put(&self, request: &Request, response: &HttpResponse);

    /// Delete every stored entry.
    fn clear(&self) -> Result<()>;
}
