// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error reporting scenarios: handler, decoding and encoding failures.

mod common;

use std::convert::Infallible;

use nimbus_runtime::{Config, Runtime, RuntimeClient, ShutdownController, handler_fn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use common::{ControlPlane, unique_request_id};

#[derive(Debug, thiserror::Error)]
#[error("nope")]
struct BadInputError;

#[derive(Deserialize)]
struct Request {
    #[allow(dead_code)]
    name: String,
}

#[derive(Serialize)]
struct Response {
    message: String,
}

#[tokio::test]
async fn test_handler_error_is_posted_with_type_name_and_message() {
    let plane = ControlPlane::start().await;
    let request_id = unique_request_id();
    plane.enqueue(&request_id, br#"{"name":"x"}"#);

    let handler =
        handler_fn(|_ctx, _request: Request| async move { Err::<Response, _>(BadInputError) });
    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(1);
    Runtime::with_parts(config, client, ShutdownController::new(), handler)
        .run()
        .await
        .unwrap();

    let errors = plane.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, request_id);
    assert_eq!(
        errors[0].1,
        json!({
            "errorType": "BadInputError",
            "errorMessage": "nope",
            "stackTrace": [],
        })
    );
}

#[tokio::test]
async fn test_cycle_continues_after_handler_error() {
    let plane = ControlPlane::start().await;
    plane.enqueue("req-1", br#"{"name":"a"}"#);
    plane.enqueue("req-2", br#"{"name":"b"}"#);

    let handler =
        handler_fn(|_ctx, _request: Request| async move { Err::<Response, _>(BadInputError) });
    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(2);
    Runtime::with_parts(config, client, ShutdownController::new(), handler)
        .run()
        .await
        .unwrap();

    let errors = plane.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].0, "req-1");
    assert_eq!(errors[1].0, "req-2");
}

#[tokio::test]
async fn test_malformed_payload_posts_decoding_error() {
    let plane = ControlPlane::start().await;
    plane.enqueue("req-1", b"{not json");

    let handler = handler_fn(|_ctx, request: Request| async move {
        Ok::<_, Infallible>(Response {
            message: request.name,
        })
    });
    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(1);
    Runtime::with_parts(config, client, ShutdownController::new(), handler)
        .run()
        .await
        .unwrap();

    let errors = plane.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1["errorType"], "DecodingError");
    assert!(plane.responses().is_empty());
}

#[tokio::test]
async fn test_unencodable_output_posts_encoding_error() {
    let plane = ControlPlane::start().await;
    plane.enqueue("req-1", br#"{"name":"x"}"#);

    let handler =
        handler_fn(|_ctx, _request: Request| async move { Ok::<_, Infallible>(f64::NAN) });
    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(1);
    Runtime::with_parts(config, client, ShutdownController::new(), handler)
        .run()
        .await
        .unwrap();

    let errors = plane.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1["errorType"], "EncodingError");
}

#[tokio::test]
async fn test_decode_failure_then_good_cycle() {
    let plane = ControlPlane::start().await;
    plane.enqueue("req-1", b"garbage");
    plane.enqueue("req-2", br#"{"name":"world"}"#);

    let handler = handler_fn(|_ctx, request: Request| async move {
        Ok::<_, Infallible>(Response {
            message: format!("Hello, {}", request.name),
        })
    });
    let client = RuntimeClient::new(&plane.endpoint(), None).unwrap();
    let config = Config::default().with_max_requests(2);
    Runtime::with_parts(config, client, ShutdownController::new(), handler)
        .run()
        .await
        .unwrap();

    assert_eq!(plane.errors().len(), 1);
    let responses = plane.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].0, "req-2");
}
