// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed payloads for common function trigger sources.
//!
//! The runtime treats every payload as opaque bytes; these types are the
//! decoders a handler opts into through the JSON codec tier:
//!
//! ```ignore
//! use nimbus_events::storage::StorageEvent;
//! use nimbus_runtime::handler_fn;
//!
//! let handler = handler_fn(|_ctx, event: StorageEvent| async move {
//!     let keys: Vec<_> = event.records.iter().map(|r| r.object().key.clone()).collect();
//!     Ok::<_, std::convert::Infallible>(keys)
//! });
//! ```

pub mod gateway;
pub mod queue;
pub mod storage;
pub mod time;
pub mod timer;

use serde::{Deserialize, Serialize};

/// Provider region identifier.
///
/// Kept as an open string: the region set grows over time and the runtime
/// never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub String);

impl Region {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
