//! Shared sequence behaviour with many connections in flight.

use std::sync::Arc;
use std::time::Duration;

use stepcheck::{ErrorCode, StepError};
use stepcheck_server::ValidatorConfig;
use tokio::sync::Barrier;
use tokio::task::JoinSet;

use crate::test_utilities::{StepConnection, TestValidator};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_next_step_accepted_exactly_once() {
    const CLIENTS: usize = 12;
    let server = TestValidator::start(5).await;
    let barrier = Arc::new(Barrier::new(CLIENTS));
    let mut tasks = JoinSet::new();

    for _ in 0..CLIENTS {
        let addr = server.addr;
        let barrier = Arc::clone(&barrier);
        tasks.spawn(async move {
            let mut conn = StepConnection::connect(addr).await;
            barrier.wait().await;
            conn.send_request(1, 10).await
        });
    }

    let mut codes = Vec::with_capacity(CLIENTS);
    while let Some(result) = tasks.join_next().await {
        codes.push(result.unwrap().code());
    }

    let ok = codes.iter().filter(|c| **c == Some(ErrorCode::Ok)).count();
    let out_of_order = codes
        .iter()
        .filter(|c| **c == Some(ErrorCode::OutOfOrder))
        .count();

    assert_eq!(ok, 1);
    assert_eq!(out_of_order, CLIENTS - 1);
    // One advance for the accept plus one per rejection.
    assert_eq!(server.current_step(), CLIENTS as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_short_timeouts_never_touch_sequence() {
    const CLIENTS: usize = 8;
    let server = TestValidator::start(5).await;
    let mut tasks = JoinSet::new();

    for step_id in 1..=CLIENTS as i64 {
        let addr = server.addr;
        tasks.spawn(async move {
            let mut conn = StepConnection::connect(addr).await;
            conn.send_request(step_id, 1).await
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap().code(), Some(ErrorCode::Timeout));
    }
    assert_eq!(server.current_step(), 0);
}

#[tokio::test]
async fn test_connection_limit_defers_extra_clients() {
    let server = TestValidator::start_with_config(ValidatorConfig {
        max_connections: Some(1),
        ..Default::default()
    })
    .await;

    let mut first = server.connect().await;
    assert!(first.send_request(1, 10).await.is_ok());

    let mut second = server.connect().await;
    second
        .write(&stepcheck::StepRequest::new(2, 10).to_bytes().unwrap())
        .await;
    let pending = second
        .read_response_within(Duration::from_millis(300))
        .await;
    assert!(pending.is_none());

    drop(first);

    let r = second.read_response_within(Duration::from_secs(5)).await;
    assert_eq!(r.map(|r| r.code()), Some(Some(ErrorCode::Ok)));
    assert_eq!(server.current_step(), 2);
}

#[tokio::test]
async fn test_zero_connection_limit_is_rejected() {
    let server = TestValidator::start_with_config(ValidatorConfig {
        max_connections: Some(0),
        ..Default::default()
    })
    .await;

    let result = server.stop().await;
    assert!(matches!(
        result,
        Err(StepError::InvalidConfig { ref field, .. }) if field == "max_connections"
    ));
}

#[tokio::test]
async fn test_serve_rejects_zero_limit_before_binding() {
    let result = stepcheck_server::serve(ValidatorConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: Some(0),
        ..Default::default()
    })
    .await;

    assert!(matches!(result, Err(StepError::InvalidConfig { .. })));
}
