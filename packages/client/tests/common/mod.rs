//! Shared mock transport: a scriptable origin that records every
//! exchange, plus pool helpers used across the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use restq_client::prelude::*;

/// What the origin saw for one network round trip.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub payload: Option<Payload>,
    /// 1-based round-trip number across the whole transport.
    pub attempt: usize,
}

/// A scripted origin reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub latency: Duration,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
            latency: Duration::ZERO,
        }
    }

    pub fn json(body: &str) -> Self {
        Self::ok(body).header("content-type", "application/json")
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid status"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            latency: Duration::ZERO,
        }
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).expect("valid header value"),
        );
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

type Responder = dyn Fn(&Exchange) -> Result<Reply> + Send + Sync;

struct Inner {
    hits: AtomicUsize,
    exchanges: Mutex<Vec<Exchange>>,
    responder: Box<Responder>,
}

/// Connector whose connections answer from a scripted responder.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub fn new(responder: impl Fn(&Exchange) -> Result<Reply> + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                hits: AtomicUsize::new(0),
                exchanges: Mutex::new(Vec::new()),
                responder: Box::new(responder),
            }),
        }
    }

    /// Origin serving the same reply to every request.
    pub fn always(reply: Reply) -> Self {
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Number of network round trips made so far.
    pub fn hits(&self) -> usize {
        self.inner.hits.load(Ordering::SeqCst)
    }

    /// Every exchange recorded so far, in order.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.inner
            .exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connector for MockTransport {
    fn connect(
        &self,
        url: &Url,
        _security: Option<&Arc<dyn TransportSecurity>>,
    ) -> Result<Box<dyn Connection>> {
        Ok(Box::new(MockConnection {
            inner: self.inner.clone(),
            url: url.clone(),
            reply: None,
        }))
    }
}

struct MockConnection {
    inner: Arc<Inner>,
    url: Url,
    reply: Option<Reply>,
}

impl Connection for MockConnection {
    fn set_timeout(&mut self, _timeout: Duration) {}

    fn set_use_caches(&mut self, _enabled: bool) {}

    fn write(
        &mut self,
        method: &Method,
        headers: &HeaderMap,
        payload: Option<&Payload>,
    ) -> Result<()> {
        let attempt = self.inner.hits.fetch_add(1, Ordering::SeqCst) + 1;
        let exchange = Exchange {
            url: self.url.clone(),
            method: method.clone(),
            headers: headers.clone(),
            payload: payload.cloned(),
            attempt,
        };
        self.inner
            .exchanges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(exchange.clone());
        let reply = (self.inner.responder)(&exchange)?;
        if !reply.latency.is_zero() {
            std::thread::sleep(reply.latency);
        }
        self.reply = Some(reply);
        Ok(())
    }

    fn status(&mut self) -> Result<StatusCode> {
        self.reply
            .as_ref()
            .map(|reply| reply.status)
            .ok_or_else(|| restq_client::error::request("status read before write"))
    }

    fn headers(&mut self) -> Result<HeaderMap> {
        self.reply
            .as_ref()
            .map(|reply| reply.headers.clone())
            .ok_or_else(|| restq_client::error::request("headers read before write"))
    }

    fn read(&mut self) -> Result<Bytes> {
        self.reply
            .as_ref()
            .map(|reply| reply.body.clone())
            .ok_or_else(|| restq_client::error::request("body read before write"))
    }
}

/// Connector whose opens always fail.
pub struct FailingConnector;

impl Connector for FailingConnector {
    fn connect(
        &self,
        _url: &Url,
        _security: Option<&Arc<dyn TransportSecurity>>,
    ) -> Result<Box<dyn Connection>> {
        Err(restq_client::error::connect("connection refused"))
    }
}

/// Single-worker pool with inline callback delivery.
pub fn single_worker_pool(transport: &MockTransport) -> RequestPool {
    RequestPool::builder()
        .core_pool_size(1)
        .connector(transport.clone())
        .main_dispatcher(InlineDispatcher)
        .build()
        .expect("pool")
}

/// Single-worker pool with an in-memory HTTP cache sharing `store`.
pub fn cached_pool(transport: &MockTransport, store: Arc<LruStore>) -> RequestPool {
    RequestPool::builder()
        .core_pool_size(1)
        .connector(transport.clone())
        .cache(HttpCache::new(store))
        .main_dispatcher(InlineDispatcher)
        .build()
        .expect("pool")
}

pub fn url(path: &str) -> Url {
    Url::parse(&format!("http://origin.test/{path}")).expect("valid url")
}

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);
