use crate::{ApplyOutcome, MergeReport, Reconciler, SyncError, SyncMetrics};

use es_core::{ChangeEvent, Entity, ErrorKind};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use tokio::sync::watch;
use uuid::Uuid;

/// Connection lifecycle of one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    Connecting,
    Live,
    Reconnecting,
    Closed,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal or most recent failure of a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SyncError> for ViewError {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

struct ViewInner<T> {
    reconciler: Reconciler<T>,
    state: SubscriptionState,
    last_error: Option<ViewError>,
    closed: bool,
    /// Set when the view was closed by a failure rather than locally.
    closed_by: Option<ViewError>,
}

/// State shared between a live view's handles and its subscriber task.
pub(crate) struct ViewShared<T> {
    name: String,
    inner: Mutex<ViewInner<T>>,
    version: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
    metrics: SyncMetrics,
}

impl<T: Entity> ViewShared<T> {
    pub(crate) fn new(name: String, reconciler: Reconciler<T>, metrics: SyncMetrics) -> Self {
        let (version, _) = watch::channel(0);
        let (shutdown, _) = watch::channel(false);
        Self {
            name,
            inner: Mutex::new(ViewInner {
                reconciler,
                state: SubscriptionState::Idle,
                last_error: None,
                closed: false,
                closed_by: None,
            }),
            version,
            shutdown,
            metrics,
        }
    }

    fn inner(&self) -> MutexGuard<'_, ViewInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Run one event through the reconciler unless the view is closed.
    pub(crate) fn apply(&self, event: ChangeEvent<T>) -> ApplyOutcome {
        let outcome = {
            let mut inner = self.inner();
            if inner.closed {
                return ApplyOutcome::Unchanged;
            }
            inner.reconciler.apply(event)
        };

        self.metrics.event_applied(T::KIND, outcome);
        if outcome.changed() {
            self.bump();
        }
        outcome
    }

    pub(crate) fn mark(&self) -> u64 {
        self.inner().reconciler.mark()
    }

    pub(crate) fn merge(&self, rows: Vec<T>, mark: u64) -> Option<MergeReport> {
        let report = {
            let mut inner = self.inner();
            if inner.closed {
                return None;
            }
            inner.reconciler.merge_snapshot(rows, mark)
        };

        if report.changed() {
            self.bump();
        }
        Some(report)
    }

    pub(crate) fn set_state(&self, state: SubscriptionState) -> bool {
        {
            let mut inner = self.inner();
            if inner.closed || inner.state == state {
                return !inner.closed;
            }
            inner.state = state;
        }

        debug!("Subscription {} -> {}", self.name, state);
        self.metrics.subscription_changed(state);
        self.bump();
        true
    }

    pub(crate) fn record_error(&self, error: ViewError) {
        self.inner().last_error = Some(error);
        self.bump();
    }

    /// Stop applying events. Returns false if already closed.
    pub(crate) fn close(&self, error: Option<ViewError>) -> bool {
        {
            let mut inner = self.inner();
            if inner.closed {
                return false;
            }
            inner.closed = true;
            inner.state = SubscriptionState::Closed;
            if let Some(error) = error {
                inner.last_error = Some(error.clone());
                inner.closed_by = Some(error);
            }
        }

        self.shutdown.send_replace(true);
        self.metrics.subscription_changed(SubscriptionState::Closed);
        self.metrics.subscription_closed();
        info!("Subscription {} closed", self.name);
        self.bump();
        true
    }
}

struct Unsubscriber {
    close: Box<dyn Fn() + Send + Sync>,
}

impl Drop for Unsubscriber {
    fn drop(&mut self) {
        (self.close)();
    }
}

/// Read handle on a live, reconciled collection.
///
/// Clones share the subscription; dropping the last clone unsubscribes.
pub struct LiveView<T> {
    shared: Arc<ViewShared<T>>,
    unsubscriber: Arc<Unsubscriber>,
}

impl<T> Clone for LiveView<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            unsubscriber: Arc::clone(&self.unsubscriber),
        }
    }
}

impl<T: Entity> LiveView<T> {
    pub(crate) fn new(shared: Arc<ViewShared<T>>, close: Box<dyn Fn() + Send + Sync>) -> Self {
        Self {
            shared,
            unsubscriber: Arc::new(Unsubscriber { close }),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Snapshot of the collection in display order.
    pub fn items(&self) -> Vec<T> {
        self.shared.inner().reconciler.items()
    }

    pub fn head(&self, n: usize) -> Vec<T> {
        self.shared.inner().reconciler.head(n)
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.shared.inner().reconciler.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.inner().reconciler.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.inner().state
    }

    pub fn last_error(&self) -> Option<ViewError> {
        self.shared.inner().last_error.clone()
    }

    /// Version counter bumped on every visible change (items or state).
    pub fn changed(&self) -> watch::Receiver<u64> {
        self.shared.version.subscribe()
    }

    /// Feed the result of a local mutation through the reconciler.
    pub fn record_mutation(&self, entity: T) -> ApplyOutcome {
        self.shared.apply(ChangeEvent::Update(entity))
    }

    /// Stop applying events. Takes effect before this returns; the transport
    /// is torn down in the background.
    pub fn unsubscribe(&self) {
        (self.unsubscriber.close)();
    }

    /// Wait until `done` holds for this view or the view closes.
    pub async fn wait_until(&self, mut done: impl FnMut(&Self) -> bool) {
        let mut rx = self.changed();
        loop {
            if done(self) || self.state() == SubscriptionState::Closed {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Wait for the first successful seed, or the failure that closed the
    /// view. A view closed by `unsubscribe()` resolves `Ok`.
    pub async fn ready(&self) -> Result<(), ViewError> {
        self.wait_until(|view| view.state() == SubscriptionState::Live)
            .await;
        match self.shared.inner().closed_by.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
