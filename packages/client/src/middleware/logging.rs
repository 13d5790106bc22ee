//! Request timing diagnostics as an interceptor.

use std::sync::Arc;
use std::time::Instant;

use http::Extensions;

use super::{PreFlow, RequestInterceptor};
use crate::error::{Error, Result};
use crate::http::Request;
use crate::pool::RequestPool;

#[derive(Debug, Clone, Copy)]
struct Baseline {
    started: Instant,
}

/// Emits one debug line per attempt with its duration, outcome status and
/// received byte count. Not in the default chain; add it when wiring a
/// pool for diagnosis.
#[derive(Debug, Default)]
pub struct LoggingInterceptor;

impl RequestInterceptor for LoggingInterceptor {
    fn pre_execute(
        &self,
        cx: &mut Extensions,
        _pool: &RequestPool,
        _request: &Arc<Request>,
    ) -> Result<PreFlow> {
        cx.insert(Baseline {
            started: Instant::now(),
        });
        Ok(PreFlow::Continue)
    }

    fn post_execute(
        &self,
        cx: &mut Extensions,
        request: &Arc<Request>,
        _pool: &RequestPool,
        error: Option<&Error>,
    ) -> Result<()> {
        let Some(baseline) = cx.get::<Baseline>() else {
            return Ok(());
        };
        let response = request.response();
        tracing::debug!(
            target: "restq::middleware",
            url = %request.url(),
            duration_ms = baseline.started.elapsed().as_millis() as u64,
            status = response.as_ref().map(|r| r.status().as_u16()),
            received = response.as_ref().map(|r| r.body().len()),
            error = error.map(tracing::field::display),
            "request attempt finished"
        );
        Ok(())
    }
}
