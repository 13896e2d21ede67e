use crate::{LiveView, QueryService, SessionContext, SyncClient};

use es_config::{Config, QueryConfig, SessionConfig};
use es_core::{Entity, EntityKind, ScanJob, ScanStatus};
use es_realtime::{MemoryFeed, RetryPolicy};
use es_store::{MemoryIdentityProvider, MemoryStore};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

pub const EMAIL: &str = "dev@example.com";
pub const PASSWORD: &str = "correct horse";

/// Everything a sync component needs, wired against in-process backends.
pub struct Harness {
    pub provider: Arc<MemoryIdentityProvider>,
    pub store: Arc<MemoryStore>,
    pub feed: Arc<MemoryFeed>,
    pub session: Arc<SessionContext>,
    pub user_id: Uuid,
}

impl Harness {
    /// One registered account, not yet signed in.
    pub fn new() -> Self {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let feed = Arc::new(MemoryFeed::default());
        let store = Arc::new(MemoryStore::with_sink(feed.clone()));
        let user_id = provider.add_user(EMAIL, PASSWORD, json!({"full_name": "Dev Eloper"}));
        let session = SessionContext::new(provider.clone(), store.clone(), session_config());

        Self {
            provider,
            store,
            feed,
            session,
            user_id,
        }
    }

    pub async fn signed_in() -> Self {
        let harness = Self::new();
        harness
            .session
            .sign_in_with_password(EMAIL, PASSWORD)
            .await
            .unwrap();
        harness
    }

    pub fn queries(&self) -> Arc<QueryService> {
        Arc::new(QueryService::new(
            Arc::clone(&self.session),
            self.store.clone(),
            &QueryConfig::default(),
        ))
    }

    pub fn client(&self) -> SyncClient {
        SyncClient::new(
            Arc::clone(&self.session),
            self.store.clone(),
            self.feed.clone(),
            &Config::default(),
        )
        .with_retry_policy(fast_retry())
    }

    /// Put a scan in place without publishing it on the feed.
    pub fn seed_scan(&self, status: ScanStatus, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .seed(EntityKind::Scan, scan_row(id, self.user_id, status, created_at));
        id
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        wait_secs: 1,
        refresh_margin_secs: 60,
        request_timeout_secs: 1,
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// `2020-01-01T00:00:00Z` plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub fn scan_row(id: Uuid, user_id: Uuid, status: ScanStatus, created_at: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "target": "https://target.example",
        "target_type": "url",
        "scan_type": "quick",
        "status": status.as_str(),
        "created_at": created_at.to_rfc3339(),
        "vulnerabilities_found": 0,
        "critical_count": 0,
        "high_count": 0,
        "medium_count": 0,
        "low_count": 0,
    })
}

pub fn scan(id: Uuid, status: ScanStatus, created_at: DateTime<Utc>) -> ScanJob {
    serde_json::from_value(scan_row(id, Uuid::nil(), status, created_at)).unwrap()
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Wait up to two seconds for `done` to hold on `view`.
pub async fn settle<T: Entity>(view: &LiveView<T>, done: impl FnMut(&LiveView<T>) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), view.wait_until(done))
        .await
        .expect("view did not settle");
}
