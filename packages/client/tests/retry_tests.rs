//! Retry policy: budget accounting, terminal failure delivery, recovery.

mod common;

use std::sync::mpsc;
use std::time::Duration;

use restq_client::prelude::*;

use common::{MockTransport, Reply, RECV_TIMEOUT, single_worker_pool, url};

#[test]
fn retry_budget_is_exhausted_then_the_error_is_delivered() {
    let transport = MockTransport::always(Reply::status(500));
    let pool = single_worker_pool(&transport);

    let (tx, rx) = mpsc::channel();
    let request = Request::builder(url("flaky"))
        .retry(2)
        .retry_interval(Duration::from_millis(20))
        .on_error(move |error, response| {
            let _ = tx.send((error.status(), response.map(|r| r.status())));
        })
        .build();
    pool.execute(request.clone()).expect("execute");

    let (error_status, response_status) = rx.recv_timeout(RECV_TIMEOUT).expect("error callback");
    // Retry budget R yields exactly R+1 network attempts.
    assert_eq!(transport.hits(), 3);
    assert_eq!(request.retry_attempted(), 2);
    assert_eq!(error_status, Some(StatusCode::INTERNAL_SERVER_ERROR));
    // The diagnostic response body travels with the terminal failure.
    assert_eq!(response_status, Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test]
fn a_retry_that_succeeds_delivers_normally() {
    let transport = MockTransport::new(|exchange| {
        Ok(if exchange.attempt < 3 {
            Reply::status(503)
        } else {
            Reply::ok("recovered").header("content-type", "text/plain")
        })
    });
    let pool = single_worker_pool(&transport);

    let (tx, rx) = mpsc::channel();
    let errors = tx.clone();
    let request = Request::builder(url("recovering"))
        .retry(5)
        .retry_interval(Duration::from_millis(20))
        .on_success(move |body, _| {
            let _ = tx.send(Ok(body));
        })
        .on_error(move |error, _| {
            let _ = errors.send(Err(error));
        })
        .build();
    pool.execute(request).expect("execute");

    let outcome = rx.recv_timeout(RECV_TIMEOUT).expect("callback");
    assert_eq!(transport.hits(), 3);
    match outcome {
        Ok(body) => assert_eq!(body.as_text(), Some("recovered")),
        Err(error) => panic!("expected success, got {error}"),
    }
}

#[test]
fn no_budget_means_a_single_attempt() {
    let transport = MockTransport::always(Reply::status(500));
    let pool = single_worker_pool(&transport);

    let (tx, rx) = mpsc::channel();
    let request = Request::builder(url("fail-fast"))
        .on_error(move |error, _| {
            let _ = tx.send(error);
        })
        .build();
    pool.execute(request).expect("execute");

    let error = rx.recv_timeout(RECV_TIMEOUT).expect("error callback");
    assert_eq!(transport.hits(), 1);
    assert!(error.is_status());
}

#[test]
fn unmarshal_failures_surface_at_delivery_and_are_not_retried() {
    struct ExplodingMarshaller;

    impl Marshaller for ExplodingMarshaller {
        fn marshal(&self, _body: &Body) -> Result<bytes::Bytes> {
            Err(restq_client::error::marshal("outbound unsupported"))
        }

        fn unmarshal(&self, _content: &[u8]) -> Result<Body> {
            Err(restq_client::error::decode("malformed payload"))
        }

        fn request_content_type(&self) -> Option<&'static str> {
            None
        }

        fn response_content_types(&self) -> &'static [&'static str] {
            &[]
        }

        fn accepts(&self, _body: &Body) -> bool {
            false
        }
    }

    let transport = MockTransport::always(Reply::ok("fine on the wire"));
    let pool = single_worker_pool(&transport);

    let (tx, rx) = mpsc::channel();
    let request = Request::builder(url("undecodable"))
        .retry(3)
        .response_marshaller(std::sync::Arc::new(ExplodingMarshaller))
        .on_error(move |error, response| {
            let _ = tx.send((error, response.is_some()));
        })
        .build();
    pool.execute(request).expect("execute");

    let (error, has_response) = rx.recv_timeout(RECV_TIMEOUT).expect("error callback");
    // Retries only govern network-level failures; the decode failure
    // happened at delivery, after the retry policy already declined.
    assert_eq!(transport.hits(), 1);
    assert!(error.is_decode());
    assert!(has_response);
}

#[test]
fn retries_wait_out_the_retry_interval() {
    let transport = MockTransport::always(Reply::status(500));
    let pool = single_worker_pool(&transport);

    let (tx, rx) = mpsc::channel();
    let started = std::time::Instant::now();
    let request = Request::builder(url("spaced"))
        .retry(2)
        .retry_interval(Duration::from_millis(100))
        .on_error(move |_, _| {
            let _ = tx.send(std::time::Instant::now());
        })
        .build();
    pool.execute(request).expect("execute");

    let finished = rx.recv_timeout(RECV_TIMEOUT).expect("error callback");
    // Two reschedules of 100 ms each have to elapse first.
    assert!(finished.duration_since(started) >= Duration::from_millis(150));
}
