// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The handler tower: three capability tiers from raw bytes to typed user code.
//!
//! - [`ByteHandler`]: raw bytes in, optional bytes out. Runs inline on the
//!   networking scheduler.
//! - [`EventHandler`]: typed input/output with a decode/encode pair wrapped
//!   around the call. Still runs on the networking scheduler, so user code
//!   must not block.
//! - [`BlockingHandler`]: continuation-style user code executed on the
//!   offload pool via [`OnPool`]; the networking scheduler is suspended, not
//!   occupied, while it runs.
//!
//! Every richer tier adapts into the leaner one, so the runner only ever
//! sees a [`ByteHandler`].

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::completer::Completer;
use crate::context::{BufferAllocator, Context};
use crate::error::{CodecError, ErrorReport};

/// Lowest handler tier: raw payload bytes to an optional response body.
///
/// `None` posts an empty response, not an error.
#[async_trait]
pub trait ByteHandler: Send + Sync {
    async fn invoke(&self, ctx: Context, payload: Bytes) -> Result<Option<Bytes>, ErrorReport>;
}

/// Typed scheduler-bound tier.
///
/// `call` runs on the networking scheduler; blocking here stalls the whole
/// loop. Use the blocking tier for anything that might block.
#[async_trait]
pub trait EventHandler: Send + Sync {
    type In: Send + 'static;
    type Out: Send + 'static;

    /// Decode the inbound payload. Failures post as `DecodingError`.
    fn decode(&self, payload: &[u8]) -> Result<Self::In, CodecError>;

    /// Encode the handler output. Failures post as `EncodingError`.
    fn encode(
        &self,
        allocator: &BufferAllocator,
        output: Self::Out,
    ) -> Result<Option<Bytes>, CodecError>;

    async fn call(&self, ctx: Context, event: Self::In) -> Result<Self::Out, ErrorReport>;
}

#[async_trait]
impl<H: EventHandler> ByteHandler for H {
    async fn invoke(&self, ctx: Context, payload: Bytes) -> Result<Option<Bytes>, ErrorReport> {
        let event = self.decode(&payload).map_err(ErrorReport::decoding)?;
        let allocator = ctx.allocator().clone();
        let output = self.call(ctx, event).await?;
        self.encode(&allocator, output).map_err(ErrorReport::encoding)
    }
}

/// Offload tier: user code that may block, completed through a [`Completer`].
pub trait BlockingHandler: Send + Sync + 'static {
    type In: Send + 'static;
    type Out: Send + 'static;

    fn decode(&self, payload: &[u8]) -> Result<Self::In, CodecError>;

    fn encode(
        &self,
        allocator: &BufferAllocator,
        output: Self::Out,
    ) -> Result<Option<Bytes>, CodecError>;

    /// Runs on the offload pool. Must signal exactly one outcome through the
    /// completer; the first signal wins.
    fn invoke(&self, ctx: Context, event: Self::In, completer: Completer<Self::Out>);
}

/// Adapter that trampolines a [`BlockingHandler`] onto the offload pool.
///
/// The wrapper suspends the invocation future while the user function runs
/// and resumes on the networking scheduler once the completer fires.
pub struct OnPool<H> {
    inner: Arc<H>,
}

impl<H> OnPool<H> {
    pub fn new(handler: H) -> Self {
        Self {
            inner: Arc::new(handler),
        }
    }
}

#[async_trait]
impl<H: BlockingHandler> EventHandler for OnPool<H> {
    type In = H::In;
    type Out = H::Out;

    fn decode(&self, payload: &[u8]) -> Result<Self::In, CodecError> {
        self.inner.decode(payload)
    }

    fn encode(
        &self,
        allocator: &BufferAllocator,
        output: Self::Out,
    ) -> Result<Option<Bytes>, CodecError> {
        self.inner.encode(allocator, output)
    }

    async fn call(&self, ctx: Context, event: Self::In) -> Result<Self::Out, ErrorReport> {
        let (completer, receiver) = Completer::new();
        let handler = self.inner.clone();
        let join = tokio::task::spawn_blocking(move || handler.invoke(ctx, event, completer));

        match receiver.await {
            Ok(outcome) => outcome,
            // The completer was dropped without a signal.
            Err(_) => match join.await {
                Err(e) if e.is_panic() => Err(ErrorReport::new(
                    "HandlerPanic",
                    "handler panicked before signalling completion",
                )),
                _ => Err(ErrorReport::new(
                    "HandlerAbandoned",
                    "handler returned without signalling completion",
                )),
            },
        }
    }
}

/// Byte-tier closure adapter; see [`bytes_handler_fn`].
pub struct BytesFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, E> ByteHandler for BytesFn<F>
where
    F: Fn(Context, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Bytes>, E>> + Send,
    E: std::error::Error + Send + Sync,
{
    async fn invoke(&self, ctx: Context, payload: Bytes) -> Result<Option<Bytes>, ErrorReport> {
        (self.f)(ctx, payload)
            .await
            .map_err(|e| ErrorReport::from_error(&e))
    }
}

/// Register a raw byte-tier closure.
pub fn bytes_handler_fn<F, Fut, E>(f: F) -> BytesFn<F>
where
    F: Fn(Context, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<Bytes>, E>> + Send,
    E: std::error::Error + Send + Sync,
{
    BytesFn { f }
}

/// UTF-8 string closure adapter; see [`text_handler_fn`].
pub struct TextFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, E> EventHandler for TextFn<F>
where
    F: Fn(Context, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send,
    E: std::error::Error + Send + Sync,
{
    type In = String;
    type Out = String;

    fn decode(&self, payload: &[u8]) -> Result<String, CodecError> {
        codec::text::decode(payload)
    }

    fn encode(
        &self,
        allocator: &BufferAllocator,
        output: String,
    ) -> Result<Option<Bytes>, CodecError> {
        codec::text::encode(allocator, output)
    }

    async fn call(&self, ctx: Context, event: String) -> Result<String, ErrorReport> {
        (self.f)(ctx, event)
            .await
            .map_err(|e| ErrorReport::from_error(&e))
    }
}

/// Register a UTF-8 string closure on the scheduler-bound tier.
pub fn text_handler_fn<F, Fut, E>(f: F) -> TextFn<F>
where
    F: Fn(Context, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, E>> + Send,
    E: std::error::Error + Send + Sync,
{
    TextFn { f }
}

/// JSON closure adapter; see [`handler_fn`].
pub struct JsonFn<F, In, Out> {
    f: F,
    _types: PhantomData<fn(In) -> Out>,
}

#[async_trait]
impl<F, Fut, In, Out, E> EventHandler for JsonFn<F, In, Out>
where
    F: Fn(Context, In) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Out, E>> + Send,
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
    E: std::error::Error + Send + Sync,
{
    type In = In;
    type Out = Out;

    fn decode(&self, payload: &[u8]) -> Result<In, CodecError> {
        codec::json::decode(payload)
    }

    fn encode(&self, allocator: &BufferAllocator, output: Out) -> Result<Option<Bytes>, CodecError> {
        codec::json::encode(allocator, output)
    }

    async fn call(&self, ctx: Context, event: In) -> Result<Out, ErrorReport> {
        (self.f)(ctx, event)
            .await
            .map_err(|e| ErrorReport::from_error(&e))
    }
}

/// Register a typed JSON closure on the scheduler-bound tier.
pub fn handler_fn<F, Fut, In, Out, E>(f: F) -> JsonFn<F, In, Out>
where
    F: Fn(Context, In) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Out, E>> + Send,
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
    E: std::error::Error + Send + Sync,
{
    JsonFn {
        f,
        _types: PhantomData,
    }
}

/// JSON continuation-style closure adapter for the offload tier.
pub struct BlockingJsonFn<F, In, Out> {
    f: F,
    _types: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> BlockingHandler for BlockingJsonFn<F, In, Out>
where
    F: Fn(Context, In, Completer<Out>) + Send + Sync + 'static,
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    type In = In;
    type Out = Out;

    fn decode(&self, payload: &[u8]) -> Result<In, CodecError> {
        codec::json::decode(payload)
    }

    fn encode(&self, allocator: &BufferAllocator, output: Out) -> Result<Option<Bytes>, CodecError> {
        codec::json::encode(allocator, output)
    }

    fn invoke(&self, ctx: Context, event: In, completer: Completer<Out>) {
        (self.f)(ctx, event, completer)
    }
}

/// Register a typed JSON continuation closure on the offload tier.
///
/// The closure runs on the worker pool and may block; it signals its result
/// through the completer.
pub fn blocking_handler_fn<F, In, Out>(f: F) -> OnPool<BlockingJsonFn<F, In, Out>>
where
    F: Fn(Context, In, Completer<Out>) + Send + Sync + 'static,
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
{
    OnPool::new(BlockingJsonFn {
        f,
        _types: PhantomData,
    })
}
