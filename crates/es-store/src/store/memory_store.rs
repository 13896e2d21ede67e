use crate::{EntityStore, StoreError, StoreResult};

use es_core::{AccessToken, ChangeRecord, ChangeSink, EntityKind, Filter, Query};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde_json::{Map, Value};
use uuid::Uuid;

/// In-process entity store.
///
/// Behaves like the hosted REST store (server-assigned ids and timestamps,
/// not-null and unique-key violations, bearer checks) and publishes every
/// committed change to an optional [`ChangeSink`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<EntityKind, Vec<Value>>>,
    sink: Option<Arc<dyn ChangeSink>>,
    revoked: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    latency: Mutex<Option<Duration>>,
    select_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish committed changes to `sink`.
    pub fn with_sink(sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::default()
        }
    }

    /// Put a row in place without checks or change notifications.
    pub fn seed(&self, kind: EntityKind, row: Value) {
        self.tables().entry(kind).or_default().push(row);
    }

    /// Current contents of a table, in insertion order.
    pub fn rows(&self, kind: EntityKind) -> Vec<Value> {
        self.tables().get(&kind).cloned().unwrap_or_default()
    }

    /// Reject every request made with `token` from now on.
    pub fn revoke_token(&self, token: &AccessToken) {
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.as_str().to_string());
    }

    /// Simulate an outage: every request fails with 503.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Delay every request by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Number of `select` calls that reached the store.
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<EntityKind, Vec<Value>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn admit(&self, token: &AccessToken) -> StoreResult<()> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::status(503, "UNAVAILABLE", "store unavailable"));
        }

        let revoked = self
            .revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token.as_str());
        if token.is_empty() || revoked {
            return Err(StoreError::status(401, "PGRST301", "JWT expired"));
        }

        Ok(())
    }

    fn publish(&self, record: ChangeRecord) {
        if let Some(sink) = &self.sink {
            sink.publish(record);
        }
    }

    fn required_columns(kind: EntityKind) -> &'static [&'static str] {
        match kind {
            EntityKind::Profile => &["id", "email"],
            EntityKind::Scan => &["user_id", "target", "target_type", "scan_type", "status"],
            EntityKind::ScanLog => &["scan_id", "level", "message"],
            EntityKind::LinkedRepo => &["user_id", "provider", "repo_full_name"],
            EntityKind::Usage => &["user_id", "month"],
        }
    }

    /// Fill server-assigned columns and enforce not-null constraints.
    fn complete_row(kind: EntityKind, row: Value) -> StoreResult<Value> {
        let Value::Object(mut fields) = row else {
            return Err(StoreError::status(400, "PGRST102", "row must be a JSON object"));
        };

        let now = Value::String(Utc::now().to_rfc3339());
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        match kind {
            EntityKind::ScanLog => {
                fields.entry("timestamp").or_insert(now);
                fields
                    .entry("metadata")
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            EntityKind::LinkedRepo => {
                fields.entry("created_at").or_insert_with(|| now.clone());
                fields.entry("updated_at").or_insert(now);
            }
            EntityKind::Usage => {
                fields.entry("scans_count").or_insert(Value::from(0));
                fields.entry("tokens_used").or_insert(Value::from(0));
            }
            EntityKind::Profile | EntityKind::Scan => {
                fields.entry("created_at").or_insert(now);
            }
        }

        for column in Self::required_columns(kind) {
            if fields.get(*column).is_none_or(Value::is_null) {
                return Err(StoreError::status(
                    400,
                    "23502",
                    format!("null value in column \"{column}\" violates not-null constraint"),
                ));
            }
        }

        Ok(Value::Object(fields))
    }

    fn merge(target: &mut Value, patch: &Value) {
        if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    fn touch(kind: EntityKind, row: &mut Value) {
        if kind == EntityKind::LinkedRepo
            && let Value::Object(fields) = row
        {
            fields.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
    }

    fn matches_all(filters: &[Filter], row: &Value) -> bool {
        filters.iter().all(|f| f.matches(row))
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn select(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        query: &Query,
    ) -> StoreResult<Vec<Value>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.admit(token).await?;

        let mut rows: Vec<Value> = self
            .tables()
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        debug!("memory select {kind}: {} rows", rows.len());
        Ok(rows)
    }

    async fn insert(&self, token: &AccessToken, kind: EntityKind, row: Value) -> StoreResult<Value> {
        self.admit(token).await?;
        let row = Self::complete_row(kind, row)?;

        let mut tables = self.tables();
        let table = tables.entry(kind).or_default();
        if table.iter().any(|r| r.get("id") == row.get("id")) {
            return Err(StoreError::status(
                409,
                "23505",
                "duplicate key value violates unique constraint",
            ));
        }
        table.push(row.clone());
        self.publish(ChangeRecord::insert(kind, row.clone()));
        Ok(row)
    }

    async fn upsert(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        row: Value,
        on_conflict: &str,
    ) -> StoreResult<Value> {
        self.admit(token).await?;
        let keys: Vec<&str> = on_conflict.split(',').map(str::trim).collect();

        let mut tables = self.tables();
        let table = tables.entry(kind).or_default();
        let existing = table
            .iter_mut()
            .find(|r| keys.iter().all(|k| r.get(*k).is_some() && r.get(*k) == row.get(*k)));

        if let Some(existing) = existing {
            let old = existing.clone();
            let mut patch = row;
            if let Value::Object(fields) = &mut patch {
                // the stored row keeps its identity
                fields.remove("id");
            }
            Self::merge(existing, &patch);
            Self::touch(kind, existing);
            let updated = existing.clone();
            self.publish(ChangeRecord::update(kind, updated.clone(), old));
            return Ok(updated);
        }

        let row = Self::complete_row(kind, row)?;
        table.push(row.clone());
        self.publish(ChangeRecord::insert(kind, row.clone()));
        Ok(row)
    }

    async fn update(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
        patch: Value,
    ) -> StoreResult<Vec<Value>> {
        self.admit(token).await?;
        if !patch.is_object() {
            return Err(StoreError::status(400, "PGRST102", "patch must be a JSON object"));
        }

        let mut tables = self.tables();
        let mut updated = Vec::new();
        for row in tables.entry(kind).or_default().iter_mut() {
            if !Self::matches_all(filters, row) {
                continue;
            }
            let old = row.clone();
            Self::merge(row, &patch);
            Self::touch(kind, row);
            self.publish(ChangeRecord::update(kind, row.clone(), old));
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
    ) -> StoreResult<Vec<Value>> {
        self.admit(token).await?;

        let mut tables = self.tables();
        let table = tables.entry(kind).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) = table
            .drain(..)
            .partition(|row| Self::matches_all(filters, row));
        *table = kept;

        for row in &removed {
            self.publish(ChangeRecord::delete(kind, row.clone()));
        }
        Ok(removed)
    }
}
