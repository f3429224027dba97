// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Nimbus Runtime - the in-process agent bridging the function control plane
//! to user handler code.
//!
//! A function container hosts an HTTP control plane with three endpoints:
//! a long-poll `next`, a per-request `response` post and a per-request
//! `error` post. This crate owns the loop that polls `next`, dispatches the
//! payload to a registered handler and posts the outcome back, exactly once
//! per invocation.
//!
//! # Features
//!
//! - **Invocation loop**: strictly serialized fetch → dispatch → post cycles
//! - **Handler tower**: raw-byte, typed and offloaded handler tiers with
//!   UTF-8 and JSON codecs built in
//! - **Lifecycle**: bounded runs, graceful drain on a configurable stop
//!   signal, precise exit codes
//! - **Error reporting**: structured error documents for decode, encode and
//!   handler failures; initialization failures reach the init-error endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use nimbus_runtime::{Context, handler_fn};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct Request {
//!     name: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Response {
//!     message: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let handler = handler_fn(|_ctx: Context, request: Request| async move {
//!         Ok::<_, std::convert::Infallible>(Response {
//!             message: format!("Hello, {}", request.name),
//!         })
//!     });
//!
//!     if let Err(e) = nimbus_runtime::run(handler).await {
//!         std::process::exit(e.exit_code());
//!     }
//! }
//! ```
//!
//! # Handler tiers
//!
//! Scheduler-bound handlers ([`handler_fn`], [`text_handler_fn`],
//! [`bytes_handler_fn`]) run inline on the networking scheduler and must
//! not block. Blocking or CPU-heavy code belongs on the offload tier
//! ([`blocking_handler_fn`]), which runs on a worker pool and signals its
//! result through a [`Completer`] - the first signal wins.
//!
//! # Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AWS_LAMBDA_RUNTIME_API` | - | Control-plane endpoint, `host:port` (required) |
//! | `LOG_LEVEL` | `info` | Logger verbosity |
//! | `MAX_REQUESTS` | unbounded | Exit cleanly after N cycles |
//! | `STOP_SIGNAL` | `TERM` | Signal that triggers draining |
//! | `REQUEST_TIMEOUT` | unbounded | Per control-plane call timeout (ms) |
//!
//! # Exit codes
//!
//! `0` clean drain, `1` unrecoverable transport failure, `2` initialization
//! failure.

mod client;
mod codec;
mod completer;
mod config;
mod context;
mod error;
mod handler;
mod lifecycle;
mod runner;
mod shutdown;

pub use client::{InvocationEnvelope, RuntimeClient};
pub use codec::{json, text};
pub use completer::Completer;
pub use config::{CONTROL_PLANE_ENDPOINT_VAR, Config, ConfigError, LogLevel, StopSignal};
pub use context::{BufferAllocator, Context};
pub use error::{ClientError, CodecError, ErrorReport, Result, RuntimeError};
pub use handler::{
    BlockingHandler, BlockingJsonFn, ByteHandler, BytesFn, EventHandler, JsonFn, OnPool, TextFn,
    blocking_handler_fn, bytes_handler_fn, handler_fn, text_handler_fn,
};
pub use lifecycle::{RunState, Runtime, run};
pub use shutdown::ShutdownController;
