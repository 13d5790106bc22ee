//! Response handler chain: the policies evaluated once an execution
//! attempt has finished.

mod callback;
mod retry;

use std::sync::Arc;

pub use callback::CallbackPolicy;
pub use retry::RetryPolicy;

use crate::error::Error;
use crate::http::Request;
use crate::pool::RequestPool;

/// One policy in the response-handler chain.
///
/// Handlers are evaluated in order until one returns `true` ("handled"),
/// which stops the chain for this attempt.
pub trait ResponseHandler: Send + Sync {
    fn on_response(
        &self,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> bool;
}

/// The default chain: retry first, delivery second.
pub fn default_handlers() -> Vec<Arc<dyn ResponseHandler>> {
    vec![Arc::new(RetryPolicy), Arc::new(CallbackPolicy)]
}
