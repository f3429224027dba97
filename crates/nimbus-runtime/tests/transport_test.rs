// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport failure scenarios: retry-once recovery and terminal exits.

mod common;

use std::convert::Infallible;
use std::time::Duration;

use nimbus_runtime::{
    ClientError, Config, ErrorReport, Runtime, RuntimeClient, RuntimeError, ShutdownController,
    text_handler_fn,
};

use common::{ControlPlane, Event};

fn echo_handler() -> impl nimbus_runtime::ByteHandler {
    text_handler_fn(|_ctx, body: String| async move { Ok::<_, Infallible>(body) })
}

#[tokio::test]
async fn test_persistent_poll_failure_terminates_with_code_1() {
    let plane = ControlPlane::start().await;
    plane.fail_next_polls(usize::MAX, 500);

    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let err = Runtime::with_parts(
        Config::default(),
        client,
        ShutdownController::new(),
        echo_handler(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Transport(ClientError::Protocol(_))
    ));
    assert_eq!(err.exit_code(), 1);
    // One attempt plus exactly one reconnect-and-retry.
    assert_eq!(plane.next_calls(), 2);
    assert!(plane.events().is_empty());
}

#[tokio::test]
async fn test_single_poll_failure_recovers_on_retry() {
    let plane = ControlPlane::start().await;
    plane.fail_next_polls(1, 500);
    plane.enqueue("req-1", b"hello");

    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(1);
    Runtime::with_parts(config, client, ShutdownController::new(), echo_handler())
        .run()
        .await
        .unwrap();

    assert_eq!(plane.next_calls(), 2);
    assert_eq!(
        plane.responses(),
        vec![("req-1".to_string(), b"hello".to_vec())]
    );
}

#[tokio::test]
async fn test_poll_timeout_is_transport_terminal() {
    let plane = ControlPlane::start().await;
    // Nothing queued: the long-poll would hang forever without the timeout.

    let client =
        RuntimeClient::new(&plane.endpoint(), Some(Duration::from_millis(100))).unwrap();
    let err = Runtime::with_parts(
        Config::default(),
        client,
        ShutdownController::new(),
        echo_handler(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Transport(ClientError::Timeout(100))
    ));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(plane.next_calls(), 2);
}

#[tokio::test]
async fn test_unreachable_control_plane_is_transport_terminal() {
    // Port 1 on loopback refuses connections.
    let client = RuntimeClient::new("127.0.0.1:1", None).unwrap();
    let err = Runtime::with_parts(
        Config::default(),
        client,
        ShutdownController::new(),
        echo_handler(),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Transport(ClientError::Transport(_))
    ));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_init_error_reaches_the_init_endpoint() {
    let plane = ControlPlane::start().await;

    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let report = ErrorReport::new("InitializationError", "handler factory failed");
    client.report_init_error(&report).await.unwrap();

    assert_eq!(
        plane.events(),
        vec![Event::InitError {
            report: serde_json::json!({
                "errorType": "InitializationError",
                "errorMessage": "handler factory failed",
                "stackTrace": [],
            })
        }]
    );
}
