//! Terminal delivery policy.

use std::sync::Arc;

use super::ResponseHandler;
use crate::error::Error;
use crate::http::Request;
use crate::pool::RequestPool;

/// Delivers the outcome to the caller's callbacks.
///
/// Discarded requests are released silently but still reported handled so
/// no later handler runs. Successful attempts are unmarshalled (with the
/// request's own marshaller, or the pool registry by content type) and
/// handed to the success callback; execution or unmarshalling failures go
/// to the error callback along with whatever response was captured.
/// Callbacks run on the worker thread or the pool's main dispatcher,
/// whichever the request asked for.
#[derive(Debug, Default)]
pub struct CallbackPolicy;

impl ResponseHandler for CallbackPolicy {
    fn on_response(
        &self,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> bool {
        if request.should_discard() {
            return true;
        }
        match error {
            None => request.deliver_success(pool),
            Some(e) => request.deliver_error(e.clone(), pool),
        }
        true
    }
}
