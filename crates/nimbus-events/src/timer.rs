// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scheduled (timer) trigger payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Region;

/// One firing of a scheduled rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimerEvent {
    pub id: String,
    pub detail_type: String,
    pub source: String,
    #[serde(with = "crate::time::iso8601")]
    pub time: DateTime<Utc>,
    pub region: Region,
    /// ARNs of the rules that fired.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Free-form detail payload; empty object for plain schedules.
    #[serde(default)]
    pub detail: serde_json::Value,
}
