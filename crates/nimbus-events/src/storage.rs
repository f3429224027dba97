// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Object-storage notification payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Region;

/// A batch of object-storage notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StorageRecord>,
}

/// One bucket/object notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    pub event_version: String,
    pub event_source: String,
    #[serde(rename = "awsRegion")]
    pub region: Region,
    #[serde(with = "crate::time::iso8601")]
    pub event_time: DateTime<Utc>,
    /// Event name, e.g. `ObjectCreated:Put`.
    pub event_name: String,
    #[serde(rename = "s3")]
    pub storage: StorageEntity,
}

impl StorageRecord {
    pub fn bucket(&self) -> &Bucket {
        &self.storage.bucket
    }

    pub fn object(&self) -> &StorageObject {
        &self.storage.object
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEntity {
    pub schema_version: String,
    pub configuration_id: String,
    pub bucket: Bucket,
    pub object: StorageObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_identity: Option<OwnerIdentity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerIdentity {
    pub principal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Ordering token for events on the same key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequencer: Option<String>,
}
