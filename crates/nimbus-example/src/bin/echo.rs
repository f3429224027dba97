// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! String identity handler on the scheduler-bound tier.

use std::convert::Infallible;

use tracing::info;

use nimbus_runtime::{Config, text_handler_fn};

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

    let handler = text_handler_fn(|ctx, body: String| async move {
        info!(request_id = %ctx.request_id(), len = body.len(), "echoing payload");
        Ok::<_, Infallible>(body)
    });

    if let Err(e) = nimbus_runtime::run(handler).await {
        eprintln!("runtime failed: {e}");
        std::process::exit(e.exit_code());
    }
}
