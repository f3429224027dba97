// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Executes one invocation cycle end-to-end: fetch, dispatch, post.

use bytes::Bytes;
use tracing::{Instrument, error, instrument, warn};

use crate::client::RuntimeClient;
use crate::context::{BufferAllocator, Context};
use crate::error::RuntimeError;
use crate::handler::ByteHandler;
use crate::shutdown::ShutdownController;

/// How one cycle ended.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Cycle {
    /// An envelope was fetched and its outcome posted (or the post failure
    /// swallowed); the envelope is consumed either way.
    Completed,
    /// A stop arrived while waiting on the long-poll; no envelope was taken.
    Interrupted,
}

/// Run a single cycle.
///
/// A `next` failure propagates and terminates the loop. An outcome-post
/// failure is logged and swallowed: the envelope is considered consumed and
/// the next cycle proceeds. Once an envelope is taken, the invocation always
/// runs to completion; only the long-poll itself is interruptible.
#[instrument(skip_all)]
pub(crate) async fn run_once<H: ByteHandler>(
    client: &RuntimeClient,
    handler: &H,
    allocator: &BufferAllocator,
    shutdown: &ShutdownController,
) -> Result<Cycle, RuntimeError> {
    let envelope = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return Ok(Cycle::Interrupted),
        envelope = client.next() => envelope?,
    };

    let ctx = Context::new(&envelope, allocator.clone());
    if ctx.deadline_passed() {
        warn!(request_id = %ctx.request_id(), "invocation arrived with an expired deadline");
    }

    let request_id = envelope.request_id.clone();
    let span = ctx.span().clone();
    let outcome = handler.invoke(ctx.clone(), envelope.payload).instrument(span).await;

    if ctx.deadline_passed() {
        warn!(request_id = %request_id, "handler completed after the deadline; posting anyway");
    }

    let posted = match outcome {
        Ok(Some(body)) => client.respond(&request_id, body).await,
        Ok(None) => client.respond(&request_id, Bytes::new()).await,
        Err(report) => client.report_error(&request_id, &report).await,
    };

    if let Err(e) = posted {
        error!(request_id = %request_id, error = %e, "failed to post invocation outcome");
    }

    Ok(Cycle::Completed)
}
