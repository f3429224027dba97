// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-invocation context handed to handlers.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tracing::Span;

use crate::client::InvocationEnvelope;

/// Byte-buffer allocator for handler output.
///
/// Buffers are tied to the invocation that allocated them; offload-tier
/// handlers must finish reading and writing before signalling completion.
#[derive(Debug, Clone, Default)]
pub struct BufferAllocator;

impl BufferAllocator {
    /// Allocate an empty buffer.
    pub fn buffer(&self) -> BytesMut {
        BytesMut::new()
    }

    /// Allocate a buffer with the given capacity.
    pub fn buffer_with_capacity(&self, capacity: usize) -> BytesMut {
        BytesMut::with_capacity(capacity)
    }
}

/// Read-only view of one invocation envelope plus ambient resources.
///
/// Cloning is cheap; all clones refer to the same invocation.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: String,
    trace_id: Option<String>,
    invoked_function_arn: Option<String>,
    deadline: Option<DateTime<Utc>>,
    cognito_identity: Option<String>,
    client_context: Option<String>,
    span: Span,
    scheduler: Handle,
    allocator: BufferAllocator,
}

impl Context {
    /// Build a context for one envelope on the current scheduler.
    pub(crate) fn new(envelope: &InvocationEnvelope, allocator: BufferAllocator) -> Self {
        let span = tracing::info_span!("invocation", request_id = %envelope.request_id);
        Self {
            inner: Arc::new(ContextInner {
                request_id: envelope.request_id.clone(),
                trace_id: envelope.trace_id.clone(),
                invoked_function_arn: envelope.invoked_function_arn.clone(),
                deadline: envelope.deadline,
                cognito_identity: envelope.cognito_identity.clone(),
                client_context: envelope.client_context.clone(),
                span,
                scheduler: Handle::current(),
                allocator,
            }),
        }
    }

    /// Opaque request identifier assigned by the control plane.
    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// Tracing identifier propagated by the provider, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.inner.trace_id.as_deref()
    }

    /// Identifier of the invoked function, if the provider sent one.
    pub fn invoked_function_arn(&self) -> Option<&str> {
        self.inner.invoked_function_arn.as_deref()
    }

    /// Absolute wall-clock deadline for this invocation.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.inner.deadline
    }

    /// Time budget left before the deadline; zero once it has passed.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether the provider deadline has already passed.
    pub fn deadline_passed(&self) -> bool {
        matches!(self.inner.deadline, Some(deadline) if deadline <= Utc::now())
    }

    /// Mobile-SDK identity blob, if any.
    pub fn cognito_identity(&self) -> Option<&str> {
        self.inner.cognito_identity.as_deref()
    }

    /// Client-context blob, if any.
    pub fn client_context(&self) -> Option<&str> {
        self.inner.client_context.as_deref()
    }

    /// Span with the request identifier pre-bound; handler logs inherit it.
    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Handle of the scheduler this invocation runs on.
    pub fn scheduler(&self) -> &Handle {
        &self.inner.scheduler
    }

    /// Buffer allocator scoped to this invocation.
    pub fn allocator(&self) -> &BufferAllocator {
        &self.inner.allocator
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.inner.request_id)
            .field("deadline", &self.inner.deadline)
            .field("invoked_function_arn", &self.inner.invoked_function_arn)
            .finish_non_exhaustive()
    }
}
