//! The executable request: configuration, lifecycle state and the
//! run template wrapping every execution attempt.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::{Extensions, HeaderMap, Method};
use url::Url;

use crate::cache::CacheControl;
use crate::connect::Connection;
use crate::error::{self, Error};
use crate::handler::{ResponseHandler, default_handlers};
use crate::http::HttpResponse;
use crate::marshal::{Body, Marshaller};
use crate::middleware::PreFlow;
use crate::pool::{RequestPool, ScheduleHandle};

type SuccessFn = Box<dyn Fn(Body, &HttpResponse) + Send + Sync>;
type ErrorFn = Box<dyn Fn(Error, Option<&HttpResponse>) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which pool a request belongs to, stamped at schedule time. The stamp
/// is compared against the pool's purge fence by [`Request::should_discard`].
struct Attachment {
    pool: RequestPool,
    stamp: u64,
}

/// A configured HTTP request and its execution lifecycle.
///
/// Built once via [`RequestBuilder`]; afterwards the only caller-facing
/// mutation is [`cancel`](Request::cancel). Shared as `Arc<Request>`
/// between the caller (as a cancel handle) and the pool (as the unit of
/// work). A request may execute several times when retries are
/// configured; each attempt gets a fresh interceptor context.
pub struct Request {
    url: Url,
    method: Method,
    headers: Mutex<HeaderMap>,
    body: Option<Body>,
    cacheable: bool,
    cache_control: Option<CacheControl>,
    max_retry: u32,
    retry_interval: Duration,
    timeout: Duration,
    deliver_on_background: bool,
    success_callback: Option<SuccessFn>,
    error_callback: Option<ErrorFn>,
    handlers: Vec<Arc<dyn ResponseHandler>>,
    response_marshaller: Option<Arc<dyn Marshaller>>,

    canceled: AtomicBool,
    retry_attempted: AtomicU32,
    attached: Mutex<Option<Attachment>>,
    handle: Mutex<Option<Arc<ScheduleHandle>>>,
    response: Mutex<Option<HttpResponse>>,
    connection: Mutex<Option<Box<dyn Connection>>>,
}

impl Request {
    pub fn builder(url: Url) -> RequestBuilder {
        RequestBuilder::new(url)
    }

    /// The request URL. Together with the method it forms the request identity.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Snapshot of the current request headers.
    pub fn headers(&self) -> HeaderMap {
        lock(&self.headers).clone()
    }

    /// Set a header, replacing any values appended at build time. Used by
    /// the cache engine to inject conditional revalidation headers before
    /// the network call.
    pub fn insert_header(&self, name: HeaderName, value: &str) {
        match HeaderValue::try_from(value) {
            Ok(value) => {
                lock(&self.headers).insert(name, value);
            }
            Err(_) => {
                tracing::warn!(
                    target: "restq::request",
                    url = %self.url,
                    header = %name,
                    "ignoring invalid header value"
                );
            }
        }
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// True when this request may be served from / stored into a cache:
    /// the builder opted in, and the request's own `Cache-Control` (when
    /// present) forbids neither caching nor storing.
    pub fn is_cacheable(&self) -> bool {
        if !self.cacheable {
            return false;
        }
        match &self.cache_control {
            Some(cc) => !cc.no_cache && !cc.no_store,
            None => true,
        }
    }

    /// `Cache-Control` parsed from the request headers at build time.
    pub fn cache_control(&self) -> Option<&CacheControl> {
        self.cache_control.as_ref()
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    pub fn retry_attempted(&self) -> u32 {
        self.retry_attempted.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_retry(&self) {
        self.retry_attempted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn response_handlers(&self) -> &[Arc<dyn ResponseHandler>] {
        &self.handlers
    }

    /// The response captured by the latest attempt, if any.
    pub fn response(&self) -> Option<HttpResponse> {
        lock(&self.response).clone()
    }

    /// Attach a response to this request. Called by the transport path
    /// and by caches serving stored or revalidated responses.
    pub fn set_response(&self, response: HttpResponse) {
        *lock(&self.response) = Some(response);
    }

    /// Run a closure against the live connection of the current attempt,
    /// when one is open. Cache backends use this to toggle
    /// transport-level caching.
    pub fn connection(&self, f: impl FnOnce(&mut dyn Connection)) {
        if let Some(conn) = lock(&self.connection).as_mut() {
            f(conn.as_mut());
        }
    }

    /// Cancel the request. Idempotent and safe to call concurrently with
    /// execution: a queued execution will not start, and a running or
    /// completed one has its callbacks suppressed.
    pub fn cancel(&self) {
        if let Some(handle) = lock(&self.handle).as_ref() {
            handle.cancel();
        }
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Whether result delivery must be suppressed: the request was
    /// canceled, or it attached to its pool before the pool's last purge.
    /// Once true this never reverts to false.
    pub fn should_discard(&self) -> bool {
        if self.canceled.load(Ordering::SeqCst) {
            return true;
        }
        match lock(&self.attached).as_ref() {
            Some(attachment) => attachment.stamp < attachment.pool.last_purge_stamp(),
            None => false,
        }
    }

    pub(crate) fn attach(&self, pool: RequestPool, stamp: u64) {
        *lock(&self.attached) = Some(Attachment { pool, stamp });
    }

    pub(crate) fn bind_handle(&self, handle: Arc<ScheduleHandle>) {
        *lock(&self.handle) = Some(handle);
    }

    pub(crate) fn attached_pool(&self) -> Option<RequestPool> {
        lock(&self.attached).as_ref().map(|a| a.pool.clone())
    }

    /// One execution attempt: open the connection, run the pre-hooks,
    /// execute the transport unless a pre-hook skipped it, then run the
    /// post-hooks in reverse order. Errors raised by pre-hooks or the
    /// transport are captured and handed to the post-hooks, never
    /// rethrown; post-hook failures are logged and swallowed.
    pub(crate) fn run(self: &Arc<Self>, pool: &RequestPool) {
        tracing::debug!(target: "restq::request", url = %self.url, "request running");

        let conn = match pool.connector().connect(&self.url, pool.transport_security()) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(
                    target: "restq::request",
                    url = %self.url,
                    error = %e,
                    "connection open failed"
                );
                // Open failures are not representable as HTTP responses;
                // they bypass the interceptor chain entirely.
                if let Some(callback) = &self.error_callback {
                    callback(e, None);
                }
                return;
            }
        };
        *lock(&self.connection) = Some(conn);

        let mut cx = Extensions::new();
        let mut thrown: Option<Error> = None;
        match self.pre_execute(&mut cx, pool) {
            Ok(PreFlow::Continue) => {
                if let Err(e) = self.execute(pool) {
                    tracing::debug!(target: "restq::request", url = %self.url, error = %e, "request error");
                    thrown = Some(e);
                }
            }
            Ok(PreFlow::Skip) => {
                tracing::debug!(target: "restq::request", url = %self.url, "request execution skipped");
            }
            Err(e) => thrown = Some(e),
        }
        self.post_execute(&mut cx, pool, thrown.as_ref());

        *lock(&self.connection) = None;
    }

    fn pre_execute(
        self: &Arc<Self>,
        cx: &mut Extensions,
        pool: &RequestPool,
    ) -> crate::error::Result<PreFlow> {
        for interceptor in pool.interceptors() {
            if interceptor.pre_execute(cx, pool, self)? == PreFlow::Skip {
                return Ok(PreFlow::Skip);
            }
        }
        Ok(PreFlow::Continue)
    }

    fn post_execute(self: &Arc<Self>, cx: &mut Extensions, pool: &RequestPool, error: Option<&Error>) {
        for interceptor in pool.interceptors().iter().rev() {
            if let Err(e) = interceptor.post_execute(cx, self, pool, error) {
                tracing::warn!(
                    target: "restq::request",
                    url = %self.url,
                    error = %e,
                    "post-execute hook failed"
                );
            }
        }
    }

    /// Drive the transport: timeout, method, headers, marshalled body,
    /// then status, headers and body of the response. The body is kept
    /// even for error statuses so it can be delivered for diagnostics.
    fn execute(&self, pool: &RequestPool) -> crate::error::Result<()> {
        let payload = match &self.body {
            Some(body) => Some(pool.marshal_registry().marshal(body)?),
            None => None,
        };
        let headers = self.headers();

        let mut guard = lock(&self.connection);
        let conn = guard
            .as_mut()
            .ok_or_else(|| error::request("connection is not open"))?;
        conn.set_timeout(self.timeout);
        conn.write(&self.method, &headers, payload.as_ref())?;
        let status = conn.status()?;
        let response_headers = conn.headers()?;
        let body = conn.read()?;
        drop(guard);

        self.set_response(HttpResponse::new(status, response_headers, body));

        if status.is_client_error() || status.is_server_error() {
            return Err(error::status_code(status, self.url.clone()));
        }
        Ok(())
    }

    /// Unmarshal the captured response and invoke the success callback on
    /// the requested execution context. An unmarshalling failure is
    /// rerouted to the error callback.
    pub fn deliver_success(self: &Arc<Self>, pool: &RequestPool) {
        let Some(response) = self.response() else {
            self.deliver_error(error::decode("no response captured for delivery"), pool);
            return;
        };
        let unmarshalled = match &self.response_marshaller {
            Some(marshaller) => marshaller.unmarshal(response.body()),
            None => Ok(pool
                .marshal_registry()
                .unmarshal(response.content_type(), response.body())),
        };
        match unmarshalled {
            Ok(body) => self.dispatch(pool, move |request| {
                if let Some(callback) = &request.success_callback {
                    callback(body, &response);
                }
            }),
            Err(e) => self.deliver_error(e, pool),
        }
    }

    /// Invoke the error callback on the requested execution context, with
    /// whatever response was captured.
    pub fn deliver_error(self: &Arc<Self>, error: Error, pool: &RequestPool) {
        let response = self.response();
        self.dispatch(pool, move |request| {
            if let Some(callback) = &request.error_callback {
                callback(error, response.as_ref());
            }
        });
    }

    fn dispatch(self: &Arc<Self>, pool: &RequestPool, f: impl FnOnce(&Request) + Send + 'static) {
        if self.deliver_on_background {
            f(self);
        } else {
            let request = self.clone();
            pool.dispatcher().dispatch(Box::new(move || f(&request)));
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("cacheable", &self.cacheable)
            .field("max_retry", &self.max_retry)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

/// Immutable request configuration, consumed into an [`Request`] by
/// [`build`](RequestBuilder::build).
pub struct RequestBuilder {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Body>,
    cacheable: bool,
    max_retry: u32,
    retry_interval: Duration,
    timeout: Duration,
    deliver_on_background: bool,
    success_callback: Option<SuccessFn>,
    error_callback: Option<ErrorFn>,
    handlers: Option<Vec<Arc<dyn ResponseHandler>>>,
    response_marshaller: Option<Arc<dyn Marshaller>>,
}

impl RequestBuilder {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            cacheable: false,
            max_retry: 0,
            retry_interval: Duration::from_millis(500),
            timeout: Duration::from_millis(3000),
            deliver_on_background: false,
            success_callback: None,
            error_callback: None,
            handlers: None,
            response_marshaller: None,
        }
    }

    /// Make this a GET request (the default).
    pub fn get(mut self) -> Self {
        self.method = Method::GET;
        self
    }

    /// Make this a POST request carrying `body`.
    pub fn post(mut self, body: impl Into<Body>) -> Self {
        self.method = Method::POST;
        self.body = Some(body.into());
        self
    }

    /// Make this a PUT request carrying `body`.
    pub fn put(mut self, body: impl Into<Body>) -> Self {
        self.method = Method::PUT;
        self.body = Some(body.into());
        self
    }

    /// Make this a DELETE request.
    pub fn delete(mut self) -> Self {
        self.method = Method::DELETE;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append a header. Repeated names accumulate in insertion order.
    /// Invalid names or values are logged and skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                tracing::warn!(target: "restq::request", name, "ignoring invalid header");
            }
        }
        self
    }

    /// Allow this request to be served from and stored into the pool's
    /// cache. Off by default.
    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Number of retries after a failed execution. Zero by default.
    pub fn retry(mut self, retries: u32) -> Self {
        self.max_retry = retries;
        self
    }

    /// Wait before each retry. Defaults to 500 ms.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Per-attempt transport timeout. Defaults to 3 s.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deliver callbacks on the worker thread instead of the pool's
    /// serialized main dispatcher.
    pub fn deliver_on_background(mut self) -> Self {
        self.deliver_on_background = true;
        self
    }

    /// Callback invoked with the unmarshalled body and the response when
    /// an attempt succeeds.
    pub fn on_success(mut self, callback: impl Fn(Body, &HttpResponse) + Send + Sync + 'static) -> Self {
        self.success_callback = Some(Box::new(callback));
        self
    }

    /// Callback invoked with the terminal error and any captured
    /// response when an attempt fails for good.
    pub fn on_error(
        mut self,
        callback: impl Fn(Error, Option<&HttpResponse>) + Send + Sync + 'static,
    ) -> Self {
        self.error_callback = Some(Box::new(callback));
        self
    }

    /// Replace the default response-handler chain
    /// (`[RetryPolicy, CallbackPolicy]`).
    pub fn response_handlers(mut self, handlers: Vec<Arc<dyn ResponseHandler>>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Unmarshal responses with this marshaller instead of dispatching on
    /// the response content type.
    pub fn response_marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
        self.response_marshaller = Some(marshaller);
        self
    }

    pub fn build(self) -> Arc<Request> {
        let cache_control = CacheControl::parse(&self.headers);
        Arc::new(Request {
            url: self.url,
            method: self.method,
            headers: Mutex::new(self.headers),
            body: self.body,
            cacheable: self.cacheable,
            cache_control,
            max_retry: self.max_retry,
            retry_interval: self.retry_interval,
            timeout: self.timeout,
            deliver_on_background: self.deliver_on_background,
            success_callback: self.success_callback,
            error_callback: self.error_callback,
            handlers: self.handlers.unwrap_or_else(default_handlers),
            response_marshaller: self.response_marshaller,
            canceled: AtomicBool::new(false),
            retry_attempted: AtomicU32::new(0),
            attached: Mutex::new(None),
            handle: Mutex::new(None),
            response: Mutex::new(None),
            connection: Mutex::new(None),
        })
    }
}
