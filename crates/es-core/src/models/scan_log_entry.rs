use crate::models::serde_helpers::{empty_object, object_if_null};
use crate::{Entity, EntityKind, ScanLogLevel};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One line of engine output attached to a scan. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanLogEntry {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: ScanLogLevel,
    pub message: String,
    #[serde(default = "empty_object", deserialize_with = "object_if_null")]
    pub metadata: Value,
}

impl Entity for ScanLogEntry {
    const KIND: EntityKind = EntityKind::ScanLog;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
