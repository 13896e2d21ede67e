use crate::live_view::ViewShared;
use crate::subscriber::Subscriber;
use crate::{
    DisplayOrder, LiveView, QueryService, Reconciler, Retention, SessionContext, SyncMetrics,
    SyncResult, ViewError,
};

use es_config::Config;
use es_core::{
    Entity, EntityKind, ErrorKind, Filter, LinkedRepository, NewScan, Order, Query, ScanJob,
    ScanLogEntry, ScanStatus,
};
use es_realtime::{ChangeFeed, FeedScope, RetryPolicy};
use es_store::EntityStore;

use std::sync::{Arc, Weak};

use chrono::Utc;
use log::info;
use serde_json::json;
use uuid::Uuid;

/// How a live collection is seeded, ordered and retained.
pub struct WatchSpec {
    pub name: String,
    pub scope: FeedScope,
    pub snapshot: Query,
    pub retention: Retention,
    pub order: DisplayOrder,
    pub capacity: Option<usize>,
}

/// Entry point for presentation code: live views over the user's scans,
/// scan logs and linked repositories, plus the scan mutations.
pub struct SyncClient {
    session: Arc<SessionContext>,
    queries: Arc<QueryService>,
    feed: Arc<dyn ChangeFeed>,
    retry: RetryPolicy,
    scan_limit: usize,
    metrics: SyncMetrics,
}

impl SyncClient {
    pub fn new(
        session: Arc<SessionContext>,
        store: Arc<dyn EntityStore>,
        feed: Arc<dyn ChangeFeed>,
        config: &Config,
    ) -> Self {
        let queries = Arc::new(QueryService::new(
            Arc::clone(&session),
            store,
            &config.query,
        ));
        Self {
            session,
            queries,
            feed,
            retry: RetryPolicy::from(&config.realtime.reconnect),
            scan_limit: config.query.scan_limit,
            metrics: SyncMetrics::new(),
        }
    }

    /// Override the reconnect policy (tests use short delays).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn queries(&self) -> &Arc<QueryService> {
        &self.queries
    }

    /// The user's most recent scans, newest first.
    pub fn watch_scans(&self, limit: Option<usize>) -> SyncResult<LiveView<ScanJob>> {
        let user_id = self.require_identity()?;
        let limit = limit.unwrap_or(self.scan_limit);
        let owner = Filter::eq("user_id", user_id.to_string());

        self.watch(WatchSpec {
            name: "scans".to_string(),
            scope: FeedScope::filtered(EntityKind::Scan, owner.clone()),
            snapshot: Query::new()
                .filter(owner)
                .order_by(Order::desc("created_at"))
                .limit(limit),
            retention: Retention::Exhaustive,
            order: DisplayOrder::NewestFirst,
            capacity: Some(limit),
        })
    }

    /// A single scan, for detail views.
    pub fn watch_scan(&self, scan_id: Uuid) -> SyncResult<LiveView<ScanJob>> {
        self.require_identity()?;
        let by_id = Filter::eq("id", scan_id.to_string());

        self.watch(WatchSpec {
            name: format!("scan:{scan_id}"),
            scope: FeedScope::filtered(EntityKind::Scan, by_id.clone()),
            snapshot: Query::new().filter(by_id).limit(1),
            retention: Retention::Exhaustive,
            order: DisplayOrder::NewestFirst,
            capacity: Some(1),
        })
    }

    /// Log stream of one scan, oldest first, append-only.
    pub fn watch_scan_logs(&self, scan_id: Uuid) -> SyncResult<LiveView<ScanLogEntry>> {
        self.require_identity()?;
        let by_scan = Filter::eq("scan_id", scan_id.to_string());

        self.watch(WatchSpec {
            name: format!("scan_logs:{scan_id}"),
            scope: FeedScope::filtered(EntityKind::ScanLog, by_scan.clone()),
            snapshot: Query::new()
                .filter(by_scan)
                .order_by(Order::asc("timestamp")),
            retention: Retention::AppendOnly,
            order: DisplayOrder::OldestFirst,
            capacity: None,
        })
    }

    pub fn watch_linked_repos(&self) -> SyncResult<LiveView<LinkedRepository>> {
        let user_id = self.require_identity()?;
        let owner = Filter::eq("user_id", user_id.to_string());

        self.watch(WatchSpec {
            name: "linked_repos".to_string(),
            scope: FeedScope::filtered(EntityKind::LinkedRepo, owner.clone()),
            snapshot: Query::new()
                .filter(owner)
                .order_by(Order::desc("created_at")),
            retention: Retention::Exhaustive,
            order: DisplayOrder::NewestFirst,
            capacity: None,
        })
    }

    pub async fn create_scan(&self, scan: NewScan) -> SyncResult<ScanJob> {
        let created: ScanJob = self.queries.create_entity(scan).await?;
        info!("Requested {} scan {} of {}", created.scan_type, created.id, created.target);
        Ok(created)
    }

    /// Request cancellation; `Conflict` once the scan already finished.
    pub async fn cancel_scan(&self, scan_id: Uuid) -> SyncResult<ScanJob> {
        let cancelled: ScanJob = self
            .queries
            .update_entity(
                scan_id,
                json!({
                    "status": ScanStatus::Cancelled.as_str(),
                    "completed_at": Utc::now().to_rfc3339(),
                }),
            )
            .await?;
        info!("Cancelled scan {}", scan_id);
        Ok(cancelled)
    }

    /// Open a live view described by `spec`. The view starts `Connecting`
    /// and becomes `Live` once seeded.
    pub fn watch<T: Entity>(&self, spec: WatchSpec) -> SyncResult<LiveView<T>> {
        let user_id = self.require_identity()?;

        let reconciler = Reconciler::with_capacity(spec.retention, spec.order, spec.capacity);
        let view = Arc::new(ViewShared::new(
            spec.name.clone(),
            reconciler,
            self.metrics.clone(),
        ));

        let weak: Weak<ViewShared<T>> = Arc::downgrade(&view);
        let on_sign_out = weak.clone();
        let registration = self.session.register_subscription(Box::new(move || {
            if let Some(view) = on_sign_out.upgrade() {
                view.close(Some(ViewError {
                    kind: ErrorKind::Unauthorized,
                    message: "signed out".to_string(),
                }));
            }
        }));

        let session = Arc::downgrade(&self.session);
        let unsubscribe = Box::new(move || {
            if let Some(view) = weak.upgrade() {
                view.close(None);
            }
            if let Some(session) = session.upgrade() {
                session.unregister_subscription(registration);
            }
        });

        let subscriber = Subscriber {
            view: Arc::clone(&view),
            session: Arc::clone(&self.session),
            queries: Arc::clone(&self.queries),
            feed: Arc::clone(&self.feed),
            retry: self.retry.clone(),
            scope: spec.scope,
            snapshot: spec.snapshot,
            user_id,
            metrics: self.metrics.clone(),
        };

        self.metrics.subscription_opened();
        info!("Watching {}", spec.name);
        tokio::spawn(subscriber.run());

        Ok(LiveView::new(view, unsubscribe))
    }

    fn require_identity(&self) -> SyncResult<Uuid> {
        self.session
            .identity_now()
            .map(|profile| profile.id)
            .ok_or_else(|| crate::SyncError::unauthorized("not signed in"))
    }
}
