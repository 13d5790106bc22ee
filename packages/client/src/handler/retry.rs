//! Retry rescheduling policy.

use std::sync::Arc;

use super::ResponseHandler;
use crate::error::Error;
use crate::http::Request;
use crate::pool::RequestPool;

/// Reschedules failed attempts until the request's retry budget is spent.
///
/// Only failures that reach the handler chain are retried: connection
/// open failures never get here, and unmarshalling failures happen later,
/// at delivery. While a retry is pending the delivery policy does not run.
#[derive(Debug, Default)]
pub struct RetryPolicy;

impl ResponseHandler for RetryPolicy {
    fn on_response(
        &self,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> bool {
        if error.is_none() {
            return false;
        }
        if request.retry_attempted() >= request.max_retry() {
            return false;
        }
        request.increment_retry();
        tracing::debug!(
            target: "restq::handler",
            url = %request.url(),
            attempt = request.retry_attempted(),
            max = request.max_retry(),
            "rescheduling failed request"
        );
        if let Err(rejected) = pool.schedule(request.clone(), request.retry_interval()) {
            // The pool shut down under us; the attempt dies quietly, like
            // any other post-completion failure.
            tracing::warn!(
                target: "restq::handler",
                url = %request.url(),
                error = %rejected,
                "retry rescheduling rejected"
            );
        }
        true
    }
}
