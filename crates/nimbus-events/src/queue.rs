// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Message-queue trigger payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Region;

/// A batch of queue messages delivered to one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueMessage>,
}

/// One queue message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub message_id: String,
    /// Token required to delete the message after processing.
    pub receipt_handle: String,
    pub body: String,
    pub attributes: QueueMessageAttributes,
    #[serde(default)]
    pub message_attributes: HashMap<String, MessageAttribute>,
    #[serde(rename = "eventSourceARN")]
    pub source_arn: String,
    #[serde(rename = "awsRegion")]
    pub region: Region,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessageAttributes {
    #[serde(with = "crate::time::epoch_millis")]
    pub sent_timestamp: DateTime<Utc>,
    pub approximate_receive_count: u32,
    #[serde(
        default,
        with = "optional_epoch_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub approximate_first_receive_timestamp: Option<DateTime<Utc>>,
}

/// User-supplied attribute attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttribute {
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

mod optional_epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|v| v.timestamp_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let millis = Option::<i64>::deserialize(deserializer)?;
        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }
}
