use crate::live_view::ViewShared;
use crate::{QueryService, SessionContext, SubscriptionState, SyncError, SyncMetrics, SyncResult, ViewError};

use es_core::{ChangeEvent, ChangeRecord, Entity, Query};
use es_realtime::{ChangeFeed, FeedScope, FeedSignal, FeedStream, RetryPolicy, with_retry};

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::sleep;
use uuid::Uuid;

/// Drives one live view: open the feed, seed from a snapshot, apply events,
/// and on transport loss reopen and gap-fill until the view is closed.
pub(crate) struct Subscriber<T> {
    pub(crate) view: Arc<ViewShared<T>>,
    pub(crate) session: Arc<SessionContext>,
    pub(crate) queries: Arc<QueryService>,
    pub(crate) feed: Arc<dyn ChangeFeed>,
    pub(crate) retry: RetryPolicy,
    pub(crate) scope: FeedScope,
    pub(crate) snapshot: Query,
    pub(crate) user_id: Uuid,
    pub(crate) metrics: SyncMetrics,
}

impl<T: Entity> Subscriber<T> {
    pub(crate) async fn run(self) {
        let shutdown = self.view.shutdown_signal();

        tokio::select! {
            _ = closed(shutdown) => {
                debug!("Subscriber {} stopping", self.view.name());
            }
            result = self.drive() => {
                if let Err(e) = result {
                    warn!("Subscriber {} failed: {}", self.view.name(), e);
                    self.view.close(Some(ViewError::from(&e)));
                }
            }
        }
    }

    /// Reconnect cycles (reopen plus gap-fill) that end without the view
    /// going live count against `retry.max_attempts`; a cycle that goes live
    /// resets the count.
    async fn drive(&self) -> SyncResult<()> {
        self.view.set_state(SubscriptionState::Connecting);
        let mut stream = self.open().await?;
        let mut failed_cycles: u32 = 0;

        loop {
            match self.resync(&mut stream).await {
                Ok(()) => {
                    failed_cycles = 0;
                    self.view.set_state(SubscriptionState::Live);
                    let reason = self.pump(&mut stream).await;
                    warn!("Subscriber {} lost its feed: {}", self.view.name(), reason);
                    self.view.record_error(ViewError {
                        kind: es_core::ErrorKind::RemoteUnavailable,
                        message: reason,
                    });
                }
                Err(e) if e.kind().is_retryable() => {
                    failed_cycles += 1;
                    warn!(
                        "Subscriber {} resync failed ({}/{}): {}",
                        self.view.name(),
                        failed_cycles,
                        self.retry.max_attempts,
                        e
                    );
                    self.view.record_error(ViewError::from(&e));
                    if failed_cycles >= self.retry.max_attempts {
                        return Err(SyncError::unavailable(format!(
                            "{} gave up after {} reconnect cycles: {}",
                            self.view.name(),
                            failed_cycles,
                            e
                        )));
                    }
                }
                Err(e) => return Err(e),
            }

            self.view.set_state(SubscriptionState::Reconnecting);
            self.metrics.reconnect_attempted();
            drop(stream);
            sleep(self.retry.delay_after(failed_cycles.max(1))).await;
            stream = self.open().await?;
            info!("Subscriber {} reconnected", self.view.name());
        }
    }

    async fn open(&self) -> SyncResult<FeedStream> {
        let this = self;
        let name = format!("open {}", this.scope.topic());
        with_retry(&this.retry, &name, move || async move {
            let token = this.session.access_token().await?;
            Ok::<_, SyncError>(this.feed.open(&token, &this.scope).await?)
        })
        .await
    }

    /// Seed or gap-fill: merge a fresh snapshot, then the events that were
    /// buffered on the stream while it was being fetched.
    async fn resync(&self, stream: &mut FeedStream) -> SyncResult<()> {
        let mark = self.view.mark();
        let rows = self
            .queries
            .fetch_collection::<T>(self.snapshot.clone())
            .await?;

        let Some(report) = self.view.merge(rows, mark) else {
            return Ok(());
        };
        debug!("Subscriber {} merged snapshot: {:?}", self.view.name(), report);

        while let Some(signal) = stream.try_next() {
            match signal {
                FeedSignal::Change(record) => self.deliver(record),
                FeedSignal::Dropped { reason } => return Err(SyncError::unavailable(reason)),
            }
        }
        Ok(())
    }

    /// Apply events until the transport goes away; returns the reason.
    async fn pump(&self, stream: &mut FeedStream) -> String {
        loop {
            match stream.next().await {
                Some(FeedSignal::Change(record)) => self.deliver(record),
                Some(FeedSignal::Dropped { reason }) => return reason,
                None => return "feed stream ended".to_string(),
            }
        }
    }

    fn deliver(&self, record: ChangeRecord) {
        let event = match record.decode::<T>() {
            Ok(event) => event,
            Err(e) => {
                warn!("Subscriber {} skipping undecodable change: {}", self.view.name(), e);
                return;
            }
        };

        if let ChangeEvent::Insert(entity) | ChangeEvent::Update(entity) = &event
            && entity.owner_id().is_some_and(|owner| owner != self.user_id)
        {
            warn!(
                "Subscriber {} dropping {} {} owned by another identity",
                self.view.name(),
                T::KIND,
                entity.id()
            );
            return;
        }

        let outcome = self.view.apply(event);
        debug!("Subscriber {} applied {} -> {}", self.view.name(), record.kind, outcome);
    }
}

async fn closed(mut shutdown: watch::Receiver<bool>) {
    loop {
        let is_closed = *shutdown.borrow_and_update();
        if is_closed || shutdown.changed().await.is_err() {
            return;
        }
    }
}
