// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure: an in-process mock control plane.
//!
//! Serves the runtime invocation endpoints from a queue of canned
//! envelopes and records every outcome post for inspection.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use tokio::sync::Notify;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const DEADLINE_MS_HEADER: &str = "Lambda-Runtime-Deadline-Ms";

/// One canned invocation the mock plane will serve.
pub struct QueuedInvocation {
    pub request_id: String,
    pub deadline_ms: Option<i64>,
    pub payload: Vec<u8>,
}

/// Everything the runtime did against the plane, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Next { request_id: String },
    Response { request_id: String, body: Vec<u8> },
    Error { request_id: String, report: serde_json::Value },
    InitError { report: serde_json::Value },
}

struct PlaneState {
    queue: Mutex<VecDeque<QueuedInvocation>>,
    events: Mutex<Vec<Event>>,
    next_calls: AtomicUsize,
    /// Serve this many `next` calls with `fail_status` before recovering.
    fail_times: AtomicUsize,
    fail_status: AtomicU16,
    wake: Notify,
}

/// Mock control plane bound to a loopback port.
pub struct ControlPlane {
    pub addr: SocketAddr,
    state: Arc<PlaneState>,
}

impl ControlPlane {
    /// Bind on an available port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(PlaneState {
            queue: Mutex::new(VecDeque::new()),
            events: Mutex::new(Vec::new()),
            next_calls: AtomicUsize::new(0),
            fail_times: AtomicUsize::new(0),
            fail_status: AtomicU16::new(500),
            wake: Notify::new(),
        });

        let app = Router::new()
            .route("/runtime/invocation/next", get(next_invocation))
            .route("/runtime/invocation/{id}/response", post(post_response))
            .route("/runtime/invocation/{id}/error", post(post_error))
            .route("/runtime/init/error", post(post_init_error))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock control plane");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock control plane error: {e}");
            }
        });

        Self { addr, state }
    }

    /// `host:port` endpoint string for the runtime client.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Queue an envelope with a deadline ten seconds out.
    pub fn enqueue(&self, request_id: &str, payload: &[u8]) {
        let deadline_ms = chrono::Utc::now().timestamp_millis() + 10_000;
        self.enqueue_with_deadline(request_id, payload, Some(deadline_ms));
    }

    pub fn enqueue_with_deadline(
        &self,
        request_id: &str,
        payload: &[u8],
        deadline_ms: Option<i64>,
    ) {
        self.state
            .queue
            .lock()
            .expect("queue lock")
            .push_back(QueuedInvocation {
                request_id: request_id.to_string(),
                deadline_ms,
                payload: payload.to_vec(),
            });
        self.state.wake.notify_one();
    }

    /// Make the next `count` polls fail with the given status.
    pub fn fail_next_polls(&self, count: usize, status: u16) {
        self.state.fail_status.store(status, Ordering::SeqCst);
        self.state.fail_times.store(count, Ordering::SeqCst);
        self.state.wake.notify_one();
    }

    pub fn next_calls(&self) -> usize {
        self.state.next_calls.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.state.queue.lock().expect("queue lock").len()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().expect("events lock").clone()
    }

    /// Recorded response posts, in order.
    pub fn responses(&self) -> Vec<(String, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Response { request_id, body } => Some((request_id, body)),
                _ => None,
            })
            .collect()
    }

    /// Recorded error posts, in order.
    pub fn errors(&self) -> Vec<(String, serde_json::Value)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error { request_id, report } => Some((request_id, report)),
                _ => None,
            })
            .collect()
    }

    /// Wait until the predicate holds or the timeout elapses.
    pub async fn wait_for<F: Fn(&Self) -> bool>(&self, predicate: F, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if predicate(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        predicate(self)
    }
}

/// A fresh, provider-shaped request identifier.
pub fn unique_request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

async fn next_invocation(State(state): State<Arc<PlaneState>>) -> Response {
    state.next_calls.fetch_add(1, Ordering::SeqCst);

    let remaining = state.fail_times.load(Ordering::SeqCst);
    if remaining > 0 {
        state.fail_times.store(remaining - 1, Ordering::SeqCst);
        let status = StatusCode::from_u16(state.fail_status.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Response::builder()
            .status(status)
            .body(axum::body::Body::empty())
            .expect("failure response");
    }

    // Long-poll: park until an envelope is queued.
    loop {
        let notified = state.wake.notified();
        let popped = state.queue.lock().expect("queue lock").pop_front();
        if let Some(invocation) = popped {
            state.events.lock().expect("events lock").push(Event::Next {
                request_id: invocation.request_id.clone(),
            });
            let mut response = Response::builder()
                .status(StatusCode::OK)
                .header(REQUEST_ID_HEADER, invocation.request_id.as_str());
            if let Some(deadline_ms) = invocation.deadline_ms {
                response = response.header(DEADLINE_MS_HEADER, deadline_ms.to_string());
            }
            return response
                .body(axum::body::Body::from(invocation.payload))
                .expect("next response");
        }
        notified.await;
    }
}

async fn post_response(
    Path(id): Path<String>,
    State(state): State<Arc<PlaneState>>,
    body: Bytes,
) -> StatusCode {
    state.events.lock().expect("events lock").push(Event::Response {
        request_id: id,
        body: body.to_vec(),
    });
    StatusCode::ACCEPTED
}

async fn post_error(
    Path(id): Path<String>,
    State(state): State<Arc<PlaneState>>,
    body: Bytes,
) -> StatusCode {
    let report = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.events.lock().expect("events lock").push(Event::Error {
        request_id: id,
        report,
    });
    StatusCode::ACCEPTED
}

async fn post_init_error(State(state): State<Arc<PlaneState>>, body: Bytes) -> StatusCode {
    let report = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state
        .events
        .lock()
        .expect("events lock")
        .push(Event::InitError { report });
    StatusCode::ACCEPTED
}
