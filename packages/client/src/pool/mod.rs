//! Worker pool and delay-aware scheduler for request execution.

mod dispatcher;

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use dispatcher::{Dispatcher, InlineDispatcher, SerialDispatcher, Task};

use crate::cache::Cache;
use crate::connect::{Connector, TransportSecurity};
use crate::error::{self, Result};
use crate::http::Request;
use crate::marshal::MarshalRegistry;
use crate::middleware::{RequestInterceptor, default_interceptors};

/// Cancellation handle for one queued execution of a request.
///
/// Canceling prevents a not-yet-started job from running; it has no
/// effect once a worker has picked the job up (the request's own discard
/// flag suppresses delivery in that case).
pub struct ScheduleHandle {
    canceled: AtomicBool,
}

impl ScheduleHandle {
    fn new() -> Self {
        Self {
            canceled: AtomicBool::new(false),
        }
    }

    pub(crate) fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// A scheduled execution: a request due at an instant.
struct Job {
    due: Instant,
    seq: u64,
    request: Arc<Request>,
    handle: Arc<ScheduleHandle>,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Job {}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Job {
    // Reversed so the max-heap pops the earliest due time; the submission
    // sequence breaks ties, which is what makes a single-worker pool
    // strictly FIFO.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue state shared with the worker threads.
///
/// Workers hold only this, never the pool itself, so dropping the last
/// pool handle winds the workers down.
struct Shared {
    queue: Mutex<BinaryHeap<Job>>,
    available: Condvar,
    shutdown: AtomicBool,
    /// Logical clock issuing attach stamps and purge fences. A request
    /// attached at stamp `a` is discarded once `a < last_purge`.
    clock: AtomicU64,
    last_purge: AtomicU64,
    seq: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: Mutex::new(BinaryHeap::new()),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
            clock: AtomicU64::new(0),
            last_purge: AtomicU64::new(0),
            seq: AtomicU64::new(0),
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, BinaryHeap<Job>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct PoolInner {
    shared: Arc<Shared>,
    cache: Option<Arc<dyn Cache>>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    connector: Arc<dyn Connector>,
    security: Option<Arc<dyn TransportSecurity>>,
    registry: Arc<MarshalRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.available.notify_all();
    }
}

/// Fixed-size worker pool executing requests, with delayed scheduling,
/// bulk purge and shutdown.
///
/// Cloning is cheap; every clone drives the same pool.
#[derive(Clone)]
pub struct RequestPool {
    inner: Arc<PoolInner>,
}

impl RequestPool {
    pub fn builder() -> RequestPoolBuilder {
        RequestPoolBuilder::new()
    }

    /// Enqueue a request for immediate execution.
    ///
    /// Fails with [`Kind::Rejected`](crate::error::Kind::Rejected) once
    /// the pool is shut down.
    pub fn execute(&self, request: Arc<Request>) -> Result<()> {
        self.schedule(request, Duration::ZERO)
    }

    /// Enqueue a request for execution after `delay`.
    ///
    /// A request that is already discarded (canceled, or fenced off by an
    /// earlier purge) is dropped silently.
    pub fn schedule(&self, request: Arc<Request>, delay: Duration) -> Result<()> {
        let shared = &self.inner.shared;
        if shared.shutdown.load(Ordering::SeqCst) {
            return Err(error::rejected());
        }
        if request.should_discard() {
            tracing::debug!(
                target: "restq::pool",
                url = %request.url(),
                "dropping discarded request"
            );
            return Ok(());
        }

        let stamp = shared.clock.fetch_add(1, Ordering::SeqCst) + 1;
        request.attach(self.clone(), stamp);
        let handle = Arc::new(ScheduleHandle::new());
        request.bind_handle(handle.clone());

        let job = Job {
            due: Instant::now() + delay,
            seq: shared.seq.fetch_add(1, Ordering::SeqCst),
            request,
            handle,
        };
        shared.lock_queue().push(job);
        shared.available.notify_one();
        Ok(())
    }

    /// Discard all queued, not-yet-started work and fence off everything
    /// submitted so far: in-flight requests finish, but their callbacks
    /// are suppressed. Requests submitted after the purge are unaffected.
    pub fn purge(&self) {
        let shared = &self.inner.shared;
        let fence = shared.clock.fetch_add(1, Ordering::SeqCst) + 1;
        shared.last_purge.store(fence, Ordering::SeqCst);
        let dropped = {
            let mut queue = shared.lock_queue();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        tracing::debug!(target: "restq::pool", dropped, "purged request queue");
    }

    /// Stop accepting work. Queued requests still drain; later
    /// submissions are rejected synchronously.
    pub fn shutdown(&self) {
        self.inner.shared.shutdown.store(true, Ordering::SeqCst);
        self.inner.shared.available.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shared.shutdown.load(Ordering::SeqCst)
    }

    /// The cache shared by every request on this pool, if one was set.
    pub fn cache(&self) -> Option<&Arc<dyn Cache>> {
        self.inner.cache.as_ref()
    }

    /// The interceptors applied to every request on this pool.
    pub fn interceptors(&self) -> &[Arc<dyn RequestInterceptor>] {
        &self.inner.interceptors
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.inner.connector
    }

    pub fn transport_security(&self) -> Option<&Arc<dyn TransportSecurity>> {
        self.inner.security.as_ref()
    }

    pub fn marshal_registry(&self) -> &MarshalRegistry {
        &self.inner.registry
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.inner.dispatcher
    }

    pub(crate) fn last_purge_stamp(&self) -> u64 {
        self.inner.shared.last_purge.load(Ordering::SeqCst)
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.lock_queue();
            loop {
                if shared.shutdown.load(Ordering::SeqCst) && queue.is_empty() {
                    return;
                }
                let now = Instant::now();
                match queue.peek().map(|job| job.due) {
                    None => {
                        queue = shared
                            .available
                            .wait(queue)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                    Some(due) if due <= now => break queue.pop(),
                    Some(due) => {
                        let (guard, _) = shared
                            .available
                            .wait_timeout(queue, due - now)
                            .unwrap_or_else(PoisonError::into_inner);
                        queue = guard;
                    }
                }
            }
        };
        let Some(job) = job else { continue };
        if job.handle.is_canceled() || job.request.should_discard() {
            tracing::debug!(
                target: "restq::pool",
                url = %job.request.url(),
                "skipping discarded request"
            );
            continue;
        }
        // The pool handle travels with the request's attachment; workers
        // themselves never keep one alive.
        let Some(pool) = job.request.attached_pool() else {
            continue;
        };
        job.request.run(&pool);
    }
}

/// Configures and builds a [`RequestPool`].
pub struct RequestPoolBuilder {
    core_pool_size: usize,
    cache: Option<Arc<dyn Cache>>,
    interceptors: Option<Vec<Arc<dyn RequestInterceptor>>>,
    connector: Option<Arc<dyn Connector>>,
    security: Option<Arc<dyn TransportSecurity>>,
    registry: Option<MarshalRegistry>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl Default for RequestPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestPoolBuilder {
    pub fn new() -> Self {
        Self {
            core_pool_size: 3,
            cache: None,
            interceptors: None,
            connector: None,
            security: None,
            registry: None,
            dispatcher: None,
        }
    }

    /// Number of worker threads, bounding concurrent network operations.
    /// Defaults to 3.
    pub fn core_pool_size(mut self, size: usize) -> Self {
        self.core_pool_size = size.max(1);
        self
    }

    /// Cache engine shared by every request on this pool. No cache by
    /// default.
    pub fn cache<C: Cache + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Replace the default interceptor chain
    /// (`[ResponseInterceptor, CacheInterceptor]`). The chain is replaced
    /// wholesale: without a `ResponseInterceptor` in it, callbacks never
    /// fire.
    pub fn interceptors(mut self, interceptors: Vec<Arc<dyn RequestInterceptor>>) -> Self {
        self.interceptors = Some(interceptors);
        self
    }

    /// The transport used to open connections. Required.
    pub fn connector<C: Connector + 'static>(mut self, connector: C) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Opaque security material handed to the connector on every open.
    pub fn transport_security<S: TransportSecurity>(mut self, security: S) -> Self {
        self.security = Some(Arc::new(security));
        self
    }

    /// Replace the default marshalling registry.
    pub fn marshal_registry(mut self, registry: MarshalRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the serialized main dispatcher callbacks are delivered on.
    pub fn main_dispatcher<D: Dispatcher + 'static>(mut self, dispatcher: D) -> Self {
        self.dispatcher = Some(Arc::new(dispatcher));
        self
    }

    pub fn build(self) -> Result<RequestPool> {
        let connector = self
            .connector
            .ok_or_else(|| error::builder("a transport connector is required"))?;
        let dispatcher: Arc<dyn Dispatcher> = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Arc::new(SerialDispatcher::spawn("restq-main")?),
        };

        let shared = Arc::new(Shared::new());
        for i in 0..self.core_pool_size {
            let shared = shared.clone();
            std::thread::Builder::new()
                .name(format!("restq-worker-{i}"))
                .spawn(move || worker_loop(shared))
                .map_err(error::builder)?;
        }

        Ok(RequestPool {
            inner: Arc::new(PoolInner {
                shared,
                cache: self.cache,
                interceptors: self.interceptors.unwrap_or_else(default_interceptors),
                connector,
                security: self.security,
                registry: Arc::new(self.registry.unwrap_or_default()),
                dispatcher,
            }),
        })
    }
}
