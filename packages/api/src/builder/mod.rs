//! Fluent request builder.
//!
//! Configuration methods chain; the HTTP verb comes last and submits the
//! request to the pool, handing back the `Arc<Request>` cancel handle.

mod methods;

use std::sync::Arc;
use std::time::Duration;

use restq_client::prelude::*;

type SuccessFn = Box<dyn Fn(Body, &HttpResponse) + Send + Sync>;
type ErrorFn = Box<dyn Fn(Error, Option<&HttpResponse>) + Send + Sync>;

/// Fluent builder over a [`RequestPool`].
///
/// ```no_run
/// # use restq::prelude::*;
/// # fn demo(pool: &RequestPool) -> Result<()> {
/// let request = Rest::with(pool)
///     .header("accept", "application/json")
///     .cacheable()
///     .on_success(|body, _| println!("{body:?}"))
///     .get("https://example.com/data")?;
/// # Ok(())
/// # }
/// ```
pub struct RestBuilder {
    pool: RequestPool,
    headers: Vec<(String, String)>,
    cacheable: bool,
    retry: u32,
    retry_interval: Option<Duration>,
    timeout: Option<Duration>,
    deliver_on_background: bool,
    success: Option<SuccessFn>,
    error: Option<ErrorFn>,
    handlers: Option<Vec<Arc<dyn ResponseHandler>>>,
    marshaller: Option<Arc<dyn Marshaller>>,
}

impl RestBuilder {
    /// Start building a request against the given pool.
    #[must_use]
    pub fn with(pool: &RequestPool) -> Self {
        Self {
            pool: pool.clone(),
            headers: Vec::new(),
            cacheable: false,
            retry: 0,
            retry_interval: None,
            timeout: None,
            deliver_on_background: false,
            success: None,
            error: None,
            handlers: None,
            marshaller: None,
        }
    }

    /// Add a request header. Repeated names accumulate in order.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Add several headers at once.
    #[must_use]
    pub fn headers<const N: usize>(mut self, pairs: [(&str, &str); N]) -> Self {
        for (name, value) in pairs {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
        self
    }

    /// Let the pool's cache serve and store this request.
    #[must_use]
    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Retry failed executions up to `retries` times.
    #[must_use]
    pub fn retry(mut self, retries: u32) -> Self {
        self.retry = retries;
        self
    }

    /// Wait between retries.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    /// Per-attempt transport timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run callbacks on the worker thread instead of the main dispatcher.
    #[must_use]
    pub fn deliver_on_background(mut self) -> Self {
        self.deliver_on_background = true;
        self
    }

    /// Raw success callback receiving the unmarshalled [`Body`].
    #[must_use]
    pub fn on_success(
        mut self,
        callback: impl Fn(Body, &HttpResponse) + Send + Sync + 'static,
    ) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    /// Typed success callback: the response body is decoded as JSON into
    /// `T`. Decoding failures are logged and dropped; use
    /// [`on_success`](Self::on_success) when they need handling.
    #[must_use]
    pub fn on_json<T, F>(self, callback: F) -> Self
    where
        T: serde::de::DeserializeOwned,
        F: Fn(T, &HttpResponse) + Send + Sync + 'static,
    {
        self.on_success(move |body, response| {
            let parsed: serde_json::Result<T> = match body {
                Body::Json(value) => serde_json::from_value(value),
                Body::Text(text) => serde_json::from_str(&text),
                Body::Bytes(bytes) => serde_json::from_slice(&bytes),
                Body::Form(_) => {
                    tracing::warn!(target: "restq::api", "form body cannot be decoded as JSON");
                    return;
                }
            };
            match parsed {
                Ok(value) => callback(value, response),
                Err(e) => {
                    tracing::warn!(target: "restq::api", error = %e, "typed JSON delivery failed");
                }
            }
        })
    }

    /// Error callback receiving the terminal failure and any captured
    /// response.
    #[must_use]
    pub fn on_error(
        mut self,
        callback: impl Fn(Error, Option<&HttpResponse>) + Send + Sync + 'static,
    ) -> Self {
        self.error = Some(Box::new(callback));
        self
    }

    /// Replace the default response-handler chain.
    #[must_use]
    pub fn response_handlers(mut self, handlers: Vec<Arc<dyn ResponseHandler>>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Unmarshal responses with this marshaller instead of dispatching on
    /// the content type.
    #[must_use]
    pub fn marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
        self.marshaller = Some(marshaller);
        self
    }

    pub(crate) fn submit(
        self,
        method: Method,
        url: &str,
        body: Option<Body>,
    ) -> Result<Arc<Request>> {
        let url: Url = url.parse().map_err(restq_client::error::builder)?;
        let mut builder = Request::builder(url).method(method);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        if self.cacheable {
            builder = builder.cacheable();
        }
        builder = builder.retry(self.retry);
        if let Some(interval) = self.retry_interval {
            builder = builder.retry_interval(interval);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if self.deliver_on_background {
            builder = builder.deliver_on_background();
        }
        if let Some(callback) = self.success {
            builder = builder.on_success(callback);
        }
        if let Some(callback) = self.error {
            builder = builder.on_error(callback);
        }
        if let Some(handlers) = self.handlers {
            builder = builder.response_handlers(handlers);
        }
        if let Some(marshaller) = self.marshaller {
            builder = builder.response_marshaller(marshaller);
        }

        let request = builder.build();
        self.pool.execute(request.clone())?;
        Ok(request)
    }
}
