use crate::{Coalescer, Credentials, SessionContext, SyncError, SyncMetrics, SyncResult};

use es_config::QueryConfig;
use es_core::{
    CoreError, Entity, EntityKind, Filter, FilterOp, Profile, ProfileUpdate, Query, ScanStatus,
    value_text,
};
use es_store::EntityStore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Identity-scoped reads and writes against the entity store.
///
/// Every call runs on behalf of the current session, is bounded by
/// `query.timeout_secs`, and is discarded as `Unauthorized` if the session
/// changed while it was in flight.
pub struct QueryService {
    session: Arc<SessionContext>,
    store: Arc<dyn EntityStore>,
    timeout: Duration,
    fetches: Coalescer<Vec<Value>>,
    metrics: SyncMetrics,
}

impl QueryService {
    pub fn new(
        session: Arc<SessionContext>,
        store: Arc<dyn EntityStore>,
        config: &QueryConfig,
    ) -> Self {
        Self {
            session,
            store,
            timeout: Duration::from_secs(config.timeout_secs),
            fetches: Coalescer::new(),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Deadline applied to every store call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches that joined an identical in-flight request.
    pub fn coalesced_fetches(&self) -> usize {
        self.fetches.joined()
    }

    pub async fn fetch_collection<T: Entity>(&self, query: Query) -> SyncResult<Vec<T>> {
        let creds = self.session.credentials().await?;
        let query = scope_query(T::KIND, query, creds.user_id)?;
        let key = format!("{}|{}|{}", creds.user_id, T::KIND, query.cache_key());

        let store = Arc::clone(&self.store);
        let token = creds.token.clone();
        let timeout = self.timeout;
        let metrics = self.metrics.clone();
        let joined_before = self.fetches.joined();

        let started = Instant::now();
        let rows = self
            .fetches
            .run(key, move || {
                async move {
                    metrics.query_issued(T::KIND, "select");
                    bounded(timeout, "select", store.select(&token, T::KIND, &query)).await
                }
                .boxed()
            })
            .await;
        if self.fetches.joined() > joined_before {
            self.metrics.query_coalesced(T::KIND);
        }
        self.metrics.query_latency(started.elapsed());

        let rows = self.finish(&creds, rows)?;
        decode_owned(rows, creds.user_id)
    }

    pub async fn fetch_one<T: Entity>(&self, id: Uuid) -> SyncResult<T> {
        let query = Query::new().filter(Filter::eq("id", id.to_string())).limit(1);
        self.fetch_collection::<T>(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::not_found(T::KIND.table(), id))
    }

    /// Create a row owned by the current identity.
    pub async fn create_entity<T: Entity>(&self, fields: impl Serialize) -> SyncResult<T> {
        let creds = self.session.credentials().await?;
        let row = force_owner(T::KIND, serde_json::to_value(fields)?, creds.user_id)?;

        self.metrics.query_issued(T::KIND, "insert");
        let created = bounded(self.timeout, "insert", self.store.insert(&creds.token, T::KIND, row)).await;
        let created = self.finish(&creds, created)?;

        debug!("Created {} {:?}", T::KIND, created.get("id"));
        Ok(T::from_row(created)?)
    }

    /// Insert or merge on `on_conflict`; used where the natural key is not the id.
    pub async fn upsert_entity<T: Entity>(
        &self,
        fields: impl Serialize,
        on_conflict: &str,
    ) -> SyncResult<T> {
        let creds = self.session.credentials().await?;
        let row = force_owner(T::KIND, serde_json::to_value(fields)?, creds.user_id)?;

        self.metrics.query_issued(T::KIND, "upsert");
        let stored = bounded(
            self.timeout,
            "upsert",
            self.store.upsert(&creds.token, T::KIND, row, on_conflict),
        )
        .await;
        Ok(T::from_row(self.finish(&creds, stored)?)?)
    }

    /// Patch one row.
    ///
    /// Scan status writes only apply while the stored status is non-terminal;
    /// a miss on a row that exists is reported as `Conflict`.
    pub async fn update_entity<T: Entity>(&self, id: Uuid, patch: impl Serialize) -> SyncResult<T> {
        let creds = self.session.credentials().await?;
        let patch = serde_json::to_value(patch)?;
        if let Some(column) = T::KIND.owner_column()
            && let Some(value) = patch.get(column)
            && value_text(value) != creds.user_id.to_string()
        {
            return Err(SyncError::unauthorized(format!(
                "cannot reassign {} {} to another identity",
                T::KIND,
                id
            )));
        }

        let mut filters = id_filters(T::KIND, id, creds.user_id)?;
        let guarded = T::KIND == EntityKind::Scan && patch.get("status").is_some();
        if guarded {
            filters.push(Filter::not_in(
                "status",
                ScanStatus::TERMINAL.iter().map(ScanStatus::as_str),
            ));
        }

        self.metrics.query_issued(T::KIND, "update");
        let updated = bounded(
            self.timeout,
            "update",
            self.store.update(&creds.token, T::KIND, &filters, patch),
        )
        .await;
        let updated = self.finish(&creds, updated)?;

        match updated.into_iter().next() {
            Some(row) => Ok(T::from_row(row)?),
            None if guarded => {
                let current = self.fetch_one::<T>(id).await?;
                warn!("Refused status write to terminal {} {}: {:?}", T::KIND, id, current);
                Err(SyncError::conflict(format!(
                    "{} {} already reached a terminal status",
                    T::KIND,
                    id
                )))
            }
            None => Err(SyncError::not_found(T::KIND.table(), id)),
        }
    }

    /// Apply the settings fields in `changes` to the current identity's
    /// profile and return the refreshed identity.
    pub async fn update_profile(&self, changes: ProfileUpdate) -> SyncResult<Profile> {
        if changes.is_empty() {
            return Err(SyncError::from(CoreError::validation(
                "no profile fields to update",
                None,
            )));
        }
        let creds = self.session.credentials().await?;
        self.update_entity::<Profile>(creds.user_id, &changes).await?;
        info!("Updated profile of {}", creds.user_id);
        self.session.refresh_profile().await
    }

    pub async fn delete_entity<T: Entity>(&self, id: Uuid) -> SyncResult<()> {
        let creds = self.session.credentials().await?;
        let filters = id_filters(T::KIND, id, creds.user_id)?;

        self.metrics.query_issued(T::KIND, "delete");
        let removed = bounded(
            self.timeout,
            "delete",
            self.store.delete(&creds.token, T::KIND, &filters),
        )
        .await;
        if self.finish(&creds, removed)?.is_empty() {
            return Err(SyncError::not_found(T::KIND.table(), id));
        }
        Ok(())
    }

    /// Delete every owned row matching `filters`; returns how many went.
    pub async fn delete_matching<T: Entity>(&self, filters: Vec<Filter>) -> SyncResult<usize> {
        let creds = self.session.credentials().await?;
        let query = scope_query(
            T::KIND,
            Query {
                filters,
                ..Query::default()
            },
            creds.user_id,
        )?;

        self.metrics.query_issued(T::KIND, "delete");
        let removed = bounded(
            self.timeout,
            "delete",
            self.store.delete(&creds.token, T::KIND, &query.filters),
        )
        .await;
        Ok(self.finish(&creds, removed)?.len())
    }

    fn finish<V>(&self, creds: &Credentials, result: SyncResult<V>) -> SyncResult<V> {
        let result = result.and_then(|value| {
            self.session.check_epoch(creds.epoch)?;
            Ok(value)
        });
        if let Err(e) = &result {
            self.metrics.error_occurred(e.kind());
        }
        result
    }
}

/// Run `request` with a deadline; expiry is reported as `SyncError::Timeout`.
pub(crate) async fn bounded<V, E>(
    timeout: Duration,
    operation: &'static str,
    request: impl Future<Output = Result<V, E>>,
) -> SyncResult<V>
where
    SyncError: From<E>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result.map_err(SyncError::from),
        Err(_) => Err(SyncError::timeout(timeout.as_secs(), operation)),
    }
}

/// Pin the owner column to `user_id`, refusing filters that name anyone else.
fn scope_query(kind: EntityKind, mut query: Query, user_id: Uuid) -> SyncResult<Query> {
    let Some(column) = kind.owner_column() else {
        return Ok(query);
    };
    let me = user_id.to_string();

    let mut pinned = false;
    for filter in query.filters_on(column) {
        match &filter.op {
            FilterOp::Eq(value) if value_text(value) == me => pinned = true,
            _ => {
                return Err(SyncError::unauthorized(format!(
                    "{} filter on {} must name the current identity",
                    kind, column
                )));
            }
        }
    }

    if !pinned {
        query.filters.push(Filter::eq(column, me));
    }
    Ok(query)
}

fn id_filters(kind: EntityKind, id: Uuid, user_id: Uuid) -> SyncResult<Vec<Filter>> {
    let mut filters = vec![Filter::eq("id", id.to_string())];
    match kind.owner_column() {
        Some("id") if id != user_id => {
            return Err(SyncError::unauthorized(format!(
                "{kind} {id} belongs to another identity"
            )));
        }
        Some("id") | None => {}
        Some(column) => filters.push(Filter::eq(column, user_id.to_string())),
    }
    Ok(filters)
}

fn force_owner(kind: EntityKind, mut row: Value, user_id: Uuid) -> SyncResult<Value> {
    let Some(column) = kind.owner_column() else {
        return Ok(row);
    };
    let Value::Object(fields) = &mut row else {
        return Err(SyncError::from(CoreError::validation(
            format!("{kind} fields must be an object"),
            None,
        )));
    };

    let me = user_id.to_string();
    if let Some(existing) = fields.get(column)
        && value_text(existing) != me
    {
        return Err(SyncError::unauthorized(format!(
            "cannot create {kind} for another identity"
        )));
    }
    fields.insert(column.to_string(), Value::String(me));
    Ok(row)
}

fn decode_owned<T: Entity>(rows: Vec<Value>, user_id: Uuid) -> SyncResult<Vec<T>> {
    let mut entities = Vec::with_capacity(rows.len());
    for row in rows {
        let entity = T::from_row(row)?;
        match entity.owner_id() {
            Some(owner) if owner != user_id => {
                warn!("Dropping {} {} owned by another identity", T::KIND, entity.id());
            }
            _ => entities.push(entity),
        }
    }
    Ok(entities)
}
