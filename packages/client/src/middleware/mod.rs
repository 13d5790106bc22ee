//! Interceptor chain wrapping every execution attempt.
//!
//! Pre-hooks run in registration order before the transport executes;
//! post-hooks run in reverse order afterwards, unwinding like resource
//! release. A pre-hook can short-circuit the network call with
//! [`PreFlow::Skip`] while still letting every post-hook run; the cache
//! hit path relies on this.

mod cache;
mod delivery;
mod logging;

use std::sync::Arc;

pub use cache::CacheInterceptor;
pub use delivery::ResponseInterceptor;
pub use logging::LoggingInterceptor;

use http::Extensions;

use crate::error::{Error, Result};
use crate::http::Request;
use crate::pool::RequestPool;

/// Outcome of a pre-execution hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreFlow {
    /// Proceed with the network call.
    Continue,
    /// Skip the network call for this attempt. Post-hooks still run.
    Skip,
}

/// A pre/post hook pair applied to every execution attempt of a request.
///
/// `cx` is a request-scoped scratchpad shared by both hooks of the same
/// attempt: use it to carry timing baselines or cache decisions from the
/// pre phase to the post phase. A fresh scratchpad is created per attempt;
/// nothing in it crosses requests.
pub trait RequestInterceptor: Send + Sync {
    /// Runs before the transport executes. Returning an error captures it
    /// like an execution failure and forwards it to the post-hooks; it is
    /// never rethrown at the caller.
    fn pre_execute(
        &self,
        cx: &mut Extensions,
        pool: &RequestPool,
        request: &Arc<Request>,
    ) -> Result<PreFlow> {
        let _ = (cx, pool, request);
        Ok(PreFlow::Continue)
    }

    /// Runs after the attempt, successful or not, right before the worker
    /// releases the request. `error` carries whatever the pre phase or
    /// the transport raised. Errors returned here are logged and
    /// swallowed; they can never unwind the worker.
    fn post_execute(
        &self,
        cx: &mut Extensions,
        request: &Arc<Request>,
        pool: &RequestPool,
        error: Option<&Error>,
    ) -> Result<()> {
        let _ = (cx, request, pool, error);
        Ok(())
    }
}

/// The default chain: delivery first, cache second, so that on the
/// reverse-ordered teardown the cache stores the response before the
/// response-handler chain delivers it.
pub fn default_interceptors() -> Vec<Arc<dyn RequestInterceptor>> {
    vec![
        Arc::new(ResponseInterceptor),
        Arc::new(CacheInterceptor),
    ]
}
