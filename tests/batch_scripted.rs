//! Timing and ordering checks on an in-memory transport.

mod common;

use common::scripted::ScriptedTransport;
use rest_batch::{BatchExecutor, BatchState, Payload, Request};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn requests_overlap_in_time() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut batch = BatchExecutor::new(transport.clone());
    for _ in 0..10 {
        batch
            .register(Request::get("http://svc.test/delay/100").unwrap())
            .unwrap();
    }

    let started = tokio::time::Instant::now();
    let responses = batch.run(Duration::from_secs(5)).await.unwrap();

    // Sequential dispatch would need a full second.
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(transport.max_concurrent.load(Ordering::SeqCst), 10);
    assert!(responses.iter().all(|r| r.http_status() == 200));
}

#[tokio::test(start_paused = true)]
async fn order_holds_when_completion_is_reversed() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut batch = BatchExecutor::new(transport);
    for ms in [50, 40, 30, 20, 10] {
        batch
            .register(Request::get(&format!("http://svc.test/delay/{}", ms)).unwrap())
            .unwrap();
    }

    let responses = batch.run(Duration::from_secs(1)).await.unwrap();

    let paths: Vec<String> = responses
        .iter()
        .map(|r| match r.body().unwrap() {
            Payload::Json(v) => v["path"].as_str().unwrap().to_string(),
            other => panic!("unexpected payload {:?}", other),
        })
        .collect();
    assert_eq!(
        paths,
        ["/delay/50", "/delay/40", "/delay/30", "/delay/20", "/delay/10"]
    );
    assert_eq!(batch.state(), BatchState::Done);
}

#[tokio::test(start_paused = true)]
async fn failures_and_timeouts_are_isolated() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut batch = BatchExecutor::new(transport);
    let ok = batch.register(Request::get("http://svc.test/ok").unwrap()).unwrap();
    let failed = batch.register(Request::get("http://svc.test/fail").unwrap()).unwrap();
    let stalled = batch
        .register(Request::get("http://svc.test/delay/60000").unwrap())
        .unwrap();

    batch.run(Duration::from_millis(250)).await.unwrap();

    assert!(ok.is_success());
    assert_eq!(failed.http_status(), 0);
    assert!(failed.error().unwrap().contains("Could not resolve host"));
    assert!(!failed.timed_out());
    assert_eq!(stalled.http_status(), 0);
    assert!(stalled.timed_out());

    let summary = batch.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.pending, 0);
}

#[tokio::test]
async fn bodies_are_encoded_once_at_dispatch() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut batch = BatchExecutor::new(transport.clone());
    let mut req = Request::put("http://svc.test/doc", json!({"k": "v"})).unwrap();
    req.set_body(json!({"k": "final"}));
    batch.register(req).unwrap();
    batch.register(Request::get("http://svc.test/doc").unwrap()).unwrap();

    batch.run(Duration::from_secs(1)).await.unwrap();
    batch.run(Duration::from_secs(1)).await.unwrap();

    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    let mut bodies = transport.seen_bodies.lock().unwrap().clone();
    bodies.sort();
    assert_eq!(bodies, vec![Vec::new(), br#"{"k":"final"}"#.to_vec()]);
}
