// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Offload-tier handler: blocking work driven by storage notifications.
//!
//! The closure runs on the worker pool, so the simulated image work may
//! block without stalling the invocation loop.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use nimbus_events::storage::StorageEvent;
use nimbus_runtime::{Completer, Config, blocking_handler_fn};

#[derive(Serialize)]
struct ThumbnailSummary {
    processed: Vec<String>,
}

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

    let handler = blocking_handler_fn(
        |ctx, event: StorageEvent, completer: Completer<ThumbnailSummary>| {
            let mut processed = Vec::new();
            for record in &event.records {
                info!(
                    request_id = %ctx.request_id(),
                    bucket = %record.bucket().name,
                    key = %record.object().key,
                    "rendering thumbnail"
                );
                // Stand-in for CPU-bound image decoding.
                std::thread::sleep(Duration::from_millis(25));
                processed.push(record.object().key.clone());
            }
            completer.succeed(ThumbnailSummary { processed });
        },
    );

    if let Err(e) = nimbus_runtime::run(handler).await {
        eprintln!("runtime failed: {e}");
        std::process::exit(e.exit_code());
    }
}
