//! Cache engine behavior through the full execution path: hits,
//! revalidation, expiry and store refusal.

mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use restq_client::prelude::*;

use common::{MockTransport, Reply, cached_pool, url, RECV_TIMEOUT};

fn cacheable_get(
    target: &Url,
    done: mpsc::Sender<Body>,
) -> Arc<Request> {
    Request::builder(target.clone())
        .cacheable()
        .on_success(move |body, _response| {
            let _ = done.send(body);
        })
        .build()
}

fn run_and_wait(pool: &RequestPool, request: Arc<Request>, done: &mpsc::Receiver<Body>) -> Body {
    pool.execute(request).expect("execute");
    done.recv_timeout(RECV_TIMEOUT).expect("callback")
}

#[test]
fn second_cacheable_get_is_served_without_a_round_trip() {
    let transport = MockTransport::always(
        Reply::json("{\"value\":1}").header("cache-control", "max-age=3600"),
    );
    let store = Arc::new(LruStore::new(16));
    let pool = cached_pool(&transport, store.clone());
    let target = url("models");

    let (tx, rx) = mpsc::channel();
    let first = run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    let second = run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 1);
    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
}

#[test]
fn expired_entry_with_etag_revalidates_and_reuses_stored_body() {
    let transport = MockTransport::new(|exchange| {
        Ok(match exchange.attempt {
            1 => Reply::json("{\"value\":\"original\"}")
                .header("etag", "\"v1\"")
                .header("cache-control", "max-age=0"),
            _ => Reply::status(304),
        })
    });
    let store = Arc::new(LruStore::new(16));
    let pool = cached_pool(&transport, store.clone());
    let target = url("volatile");

    let (tx, rx) = mpsc::channel();
    let first = run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);

    // Let the max-age=0 entry age past its freshness window.
    std::thread::sleep(Duration::from_millis(50));

    let second = run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 2);
    let revalidation = &transport.exchanges()[1];
    assert_eq!(
        revalidation
            .headers
            .get("if-none-match")
            .and_then(|v| v.to_str().ok()),
        Some("\"v1\"")
    );
    // The 304 round trip revalidated the cached body.
    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
}

#[test]
fn expired_entry_without_etag_is_deleted_and_refetched() {
    let transport = MockTransport::new(|exchange| {
        Ok(match exchange.attempt {
            1 => Reply::json("{\"value\":\"short-lived\"}").header("cache-control", "max-age=0"),
            // No caching headers at all: the refetch must not be stored.
            _ => Reply::json("{\"value\":\"fresh\"}"),
        })
    });
    let store = Arc::new(LruStore::new(16));
    let pool = cached_pool(&transport, store.clone());
    let target = url("uncached");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    assert_eq!(store.len(), 1);

    std::thread::sleep(Duration::from_millis(50));

    let second = run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 2);
    assert_eq!(second, Body::Json(serde_json::json!({"value": "fresh"})));
    // No conditional header was sent: there was no entity tag to offer.
    assert!(transport.exchanges()[1].headers.get("if-none-match").is_none());
    // The expired entry was deleted and the uncacheable refetch not stored.
    assert_eq!(store.len(), 0);
}

#[test]
fn s_maxage_governs_freshness_over_max_age() {
    // Fresh by s-maxage even though max-age says stale.
    let transport = MockTransport::always(
        Reply::json("{}").header("cache-control", "s-maxage=3600, max-age=0"),
    );
    let pool = cached_pool(&transport, Arc::new(LruStore::new(16)));
    let target = url("shared-fresh");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    std::thread::sleep(Duration::from_millis(50));
    run_and_wait(&pool, cacheable_get(&target, tx), &rx);
    assert_eq!(transport.hits(), 1);

    // Stale by s-maxage even though max-age says fresh.
    let transport = MockTransport::always(
        Reply::json("{}").header("cache-control", "s-maxage=0, max-age=3600"),
    );
    let pool = cached_pool(&transport, Arc::new(LruStore::new(16)));
    let target = url("shared-stale");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    std::thread::sleep(Duration::from_millis(50));
    run_and_wait(&pool, cacheable_get(&target, tx), &rx);
    assert_eq!(transport.hits(), 2);
}

#[test]
fn must_revalidate_forces_the_network() {
    let transport = MockTransport::always(
        Reply::json("{}").header("cache-control", "max-age=3600, must-revalidate"),
    );
    let pool = cached_pool(&transport, Arc::new(LruStore::new(16)));
    let target = url("strict");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 2);
}

#[test]
fn only_if_cached_serves_stale_entries() {
    let transport =
        MockTransport::always(Reply::json("{\"v\":1}").header("cache-control", "max-age=0"));
    let pool = cached_pool(&transport, Arc::new(LruStore::new(16)));
    let target = url("offline");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);

    std::thread::sleep(Duration::from_millis(50));

    // Expired, but the request only wants the cached copy.
    let request = Request::builder(target)
        .cacheable()
        .header("cache-control", "only-if-cached")
        .on_success(move |body, _| {
            let _ = tx.send(body);
        })
        .build();
    let body = run_and_wait(&pool, request, &rx);

    assert_eq!(transport.hits(), 1);
    assert_eq!(body, Body::Json(serde_json::json!({"v": 1})));
}

#[test]
fn no_store_responses_are_never_cached() {
    let transport =
        MockTransport::always(Reply::json("{}").header("cache-control", "no-store"));
    let store = Arc::new(LruStore::new(16));
    let pool = cached_pool(&transport, store.clone());
    let target = url("secret");

    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 2);
    assert_eq!(store.len(), 0);
}

#[test]
fn disk_cache_delegates_to_the_platform() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingPlatform {
        flushes: AtomicUsize,
        resets: AtomicUsize,
    }

    impl PlatformCache for RecordingPlatform {
        fn flush(&self) {
            self.flushes.fetch_add(1, Ordering::SeqCst);
        }

        fn reset(&self) -> Result<()> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let platform = Arc::new(RecordingPlatform::default());
    let cache = DiskCache::new(platform.clone());

    let transport = MockTransport::always(Reply::json("{}"));
    let pool = RequestPool::builder()
        .core_pool_size(1)
        .connector(transport.clone())
        .cache(cache)
        .main_dispatcher(InlineDispatcher)
        .build()
        .expect("pool");
    let target = url("platform");

    // Every request reaches the transport: freshness is the platform's
    // job, the engine only signals it.
    let (tx, rx) = mpsc::channel();
    run_and_wait(&pool, cacheable_get(&target, tx.clone()), &rx);
    run_and_wait(&pool, cacheable_get(&target, tx), &rx);

    assert_eq!(transport.hits(), 2);
    assert_eq!(platform.flushes.load(Ordering::SeqCst), 2);

    pool.cache().expect("cache").clear().expect("clear");
    assert_eq!(platform.resets.load(Ordering::SeqCst), 1);
}

#[test]
fn non_get_requests_bypass_the_cache() {
    let transport = MockTransport::always(
        Reply::json("{}").header("cache-control", "max-age=3600"),
    );
    let store = Arc::new(LruStore::new(16));
    let pool = cached_pool(&transport, store.clone());
    let target = url("mutations");

    let (tx, rx) = mpsc::channel();
    for _ in 0..2 {
        let tx = tx.clone();
        let request = Request::builder(target.clone())
            .post(Body::Json(serde_json::json!({"op": "create"})))
            .cacheable()
            .on_success(move |body, _| {
                let _ = tx.send(body);
            })
            .build();
        run_and_wait(&pool, request, &rx);
    }

    assert_eq!(transport.hits(), 2);
    assert_eq!(store.len(), 0);
}
