// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed JSON handler: decodes a request, returns a greeting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nimbus_runtime::{Config, handler_fn};

#[derive(Deserialize)]
struct Request {
    name: String,
}

#[derive(Serialize)]
struct Response {
    message: String,
}

#[derive(Debug, Error)]
#[error("name must not be empty")]
struct EmptyNameError;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_str())),
        )
        .init();

    let handler = handler_fn(|_ctx, request: Request| async move {
        if request.name.is_empty() {
            return Err(EmptyNameError);
        }
        Ok(Response {
            message: format!("Hello, {}", request.name),
        })
    });

    if let Err(e) = nimbus_runtime::run(handler).await {
        eprintln!("runtime failed: {e}");
        std::process::exit(e.exit_code());
    }
}
