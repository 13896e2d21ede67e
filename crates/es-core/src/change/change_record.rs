use crate::{ChangeEvent, ChangeKind, CoreError, CoreResult, Entity, EntityKind};

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// An untyped row change as delivered by a change feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub table: EntityKind,
    /// New row image; `Null` for deletes.
    pub record: Value,
    /// Previous row image; at least the primary key for deletes.
    pub old_record: Value,
    pub commit_timestamp: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    pub fn insert(table: EntityKind, record: Value) -> Self {
        Self {
            kind: ChangeKind::Insert,
            table,
            record,
            old_record: Value::Null,
            commit_timestamp: Some(Utc::now()),
        }
    }

    pub fn update(table: EntityKind, record: Value, old_record: Value) -> Self {
        Self {
            kind: ChangeKind::Update,
            table,
            record,
            old_record,
            commit_timestamp: Some(Utc::now()),
        }
    }

    pub fn delete(table: EntityKind, old_record: Value) -> Self {
        Self {
            kind: ChangeKind::Delete,
            table,
            record: Value::Null,
            old_record,
            commit_timestamp: Some(Utc::now()),
        }
    }

    /// The row image filters should be evaluated against.
    pub fn row(&self) -> &Value {
        match self.kind {
            ChangeKind::Delete => &self.old_record,
            _ => &self.record,
        }
    }

    pub fn row_id(&self) -> Option<Uuid> {
        self.row()
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Decode into a typed event for `T`.
    #[track_caller]
    pub fn decode<T: Entity>(&self) -> CoreResult<ChangeEvent<T>> {
        if self.table != T::KIND {
            return Err(CoreError::validation(
                format!("change for {} cannot decode as {}", self.table, T::KIND),
                Some("table"),
            ));
        }

        match self.kind {
            ChangeKind::Insert => Ok(ChangeEvent::Insert(T::from_row(self.record.clone())?)),
            ChangeKind::Update => Ok(ChangeEvent::Update(T::from_row(self.record.clone())?)),
            ChangeKind::Delete => self.row_id().map(ChangeEvent::Delete).ok_or_else(|| {
                CoreError::validation("delete change without a row id", Some("old_record"))
            }),
        }
    }
}
