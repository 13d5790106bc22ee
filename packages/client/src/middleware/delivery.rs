//! Response delivery as an interceptor.

use std::sync::Arc;

use http::Extensions;

use super::RequestInterceptor;
use crate::error::{Error, Result};
use crate::http::Request;
use crate::pool::RequestPool;

/// Runs the request's response-handler chain after execution.
///
/// Handlers are evaluated in order until one reports the response
/// handled. Required in the interceptor chain for callbacks to fire; a
/// caller overriding the chain without it opts out of delivery.
#[derive(Debug, Default)]
pub struct ResponseInterceptor;

impl RequestInterceptor for ResponseInterceptor {
    fn post_execute(
        &self,
        _cx: &mut Extensions,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> Result<()> {
        // Canceled or purged requests are released without a word.
        if request.should_discard() {
            tracing::debug!(
                target: "restq::middleware",
                url = %request.url(),
                "request discarded, suppressing delivery"
            );
            return Ok(());
        }
        for handler in request.response_handlers() {
            if handler.on_response(request, pool, error) {
                break;
            }
        }
        Ok(())
    }
}
