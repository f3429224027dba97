// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Built-in decode/encode pairs for the typed handler tiers.
//!
//! Handlers with binary or custom framing override `decode`/`encode`
//! instead of going through these.

/// UTF-8 string codec (identity framing).
pub mod text {
    use bytes::{BufMut, Bytes};

    use crate::context::BufferAllocator;
    use crate::error::CodecError;

    pub fn decode(payload: &[u8]) -> Result<String, CodecError> {
        Ok(String::from_utf8(payload.to_vec())?)
    }

    pub fn encode(allocator: &BufferAllocator, value: String) -> Result<Option<Bytes>, CodecError> {
        let mut buffer = allocator.buffer_with_capacity(value.len());
        buffer.put_slice(value.as_bytes());
        Ok(Some(buffer.freeze()))
    }
}

/// JSON codec for serde-declared types.
pub mod json {
    use bytes::{BufMut, Bytes};
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use crate::context::BufferAllocator;
    use crate::error::CodecError;

    pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn encode<T: Serialize>(
        allocator: &BufferAllocator,
        value: T,
    ) -> Result<Option<Bytes>, CodecError> {
        let mut buffer = allocator.buffer().writer();
        serde_json::to_writer(&mut buffer, &value)?;
        Ok(Some(buffer.into_inner().freeze()))
    }
}
