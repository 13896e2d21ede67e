use crate::{ApplyOutcome, SubscriptionState};

use es_core::{EntityKind, ErrorKind};

use metrics::{counter, gauge, histogram};

/// Metrics collector for sync operations
#[derive(Clone)]
pub struct SyncMetrics {
    prefix: &'static str,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self { prefix: "es_sync" }
    }

    /// Record a request sent to the entity store
    pub fn query_issued(&self, kind: EntityKind, operation: &str) {
        counter!(format!("{}.queries.issued", self.prefix)).increment(1);
        counter!(format!("{}.queries.{}.{}", self.prefix, kind, operation)).increment(1);
    }

    /// Record a fetch answered by an already in-flight request
    pub fn query_coalesced(&self, kind: EntityKind) {
        counter!(format!("{}.queries.coalesced.{}", self.prefix, kind)).increment(1);
    }

    pub fn query_latency(&self, duration: std::time::Duration) {
        histogram!(format!("{}.queries.latency_ms", self.prefix))
            .record(duration.as_millis() as f64);
    }

    /// Record error occurrence
    pub fn error_occurred(&self, kind: ErrorKind) {
        counter!(format!("{}.errors.total", self.prefix)).increment(1);
        counter!(format!("{}.errors.{}", self.prefix, kind.as_str())).increment(1);
    }

    pub fn event_applied(&self, kind: EntityKind, outcome: ApplyOutcome) {
        counter!(format!("{}.events.{}", self.prefix, kind)).increment(1);
        counter!(format!("{}.events.{}", self.prefix, outcome.as_str())).increment(1);
    }

    pub fn subscription_changed(&self, state: SubscriptionState) {
        counter!(format!("{}.subscriptions.{}", self.prefix, state.as_str())).increment(1);
    }

    pub fn subscription_opened(&self) {
        gauge!(format!("{}.subscriptions.active", self.prefix)).increment(1.0);
    }

    pub fn subscription_closed(&self) {
        gauge!(format!("{}.subscriptions.active", self.prefix)).decrement(1.0);
    }

    pub fn reconnect_attempted(&self) {
        counter!(format!("{}.subscriptions.reconnects", self.prefix)).increment(1);
    }

    pub fn link_finished(&self, outcome: &str) {
        counter!(format!("{}.link.{}", self.prefix, outcome)).increment(1);
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
