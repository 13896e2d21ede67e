use crate::StoreResult;

use es_core::{AccessToken, EntityKind, Filter, Query};

use async_trait::async_trait;
use serde_json::Value;

/// Row-level access to the remote tables.
///
/// Every call carries the caller's bearer credential; the store enforces its
/// own access rules on top of whatever filters the caller sends.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn select(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        query: &Query,
    ) -> StoreResult<Vec<Value>>;

    /// Insert one row and return it as stored (with server-assigned fields).
    async fn insert(&self, token: &AccessToken, kind: EntityKind, row: Value) -> StoreResult<Value>;

    /// Insert or merge on the comma-separated `on_conflict` columns.
    async fn upsert(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        row: Value,
        on_conflict: &str,
    ) -> StoreResult<Value>;

    /// Patch every row matching `filters`; returns the rows as updated.
    async fn update(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
        patch: Value,
    ) -> StoreResult<Vec<Value>>;

    /// Delete every row matching `filters`; returns the removed rows.
    async fn delete(
        &self,
        token: &AccessToken,
        kind: EntityKind,
        filters: &[Filter],
    ) -> StoreResult<Vec<Value>>;
}
