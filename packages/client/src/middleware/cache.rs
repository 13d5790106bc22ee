//! Cache lookup and store as an interceptor.

use std::sync::Arc;

use http::Extensions;

use super::{PreFlow, RequestInterceptor};
use crate::error::{Error, Result};
use crate::http::Request;
use crate::pool::RequestPool;

/// Context marker recording that this attempt was answered from the
/// cache, so the post phase does not store the served response again.
#[derive(Debug, Clone, Copy)]
struct CacheHit;

/// Interceptor hosting the pool's [`Cache`](crate::cache::Cache).
///
/// The pre phase looks the request up and, on a hit, attaches the stored
/// response and skips the network call. The lookup may also mutate the
/// request (injecting `If-None-Match` for revalidation), which is why it
/// must happen before the transport executes. The post phase offers the
/// received response for storage.
#[derive(Debug, Default)]
pub struct CacheInterceptor;

impl RequestInterceptor for CacheInterceptor {
    fn pre_execute(
        &self,
        cx: &mut Extensions,
        pool: &RequestPool,
        request: &Arc<Request>,
    ) -> Result<PreFlow> {
        let Some(cache) = pool.cache() else {
            return Ok(PreFlow::Continue);
        };
        if !request.is_cacheable() {
            return Ok(PreFlow::Continue);
        }
        if let Some(response) = cache.get(request) {
            tracing::debug!(
                target: "restq::middleware::cache",
                url = %request.url(),
                "serving response from cache"
            );
            request.set_response(response);
            cx.insert(CacheHit);
            return Ok(PreFlow::Skip);
        }
        Ok(PreFlow::Continue)
    }

    fn post_execute(
        &self,
        cx: &mut Extensions,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> Result<()> {
        if error.is_some() || cx.get::<CacheHit>().is_some() {
            return Ok(());
        }
        let Some(cache) = pool.cache() else {
            return Ok(());
        };
        if !request.is_cacheable() {
            return Ok(());
        }
        if let Some(response) = request.response() {
            cache.put(request, &response);
        }
        Ok(())
    }
}
