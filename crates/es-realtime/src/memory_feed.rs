use crate::{ChangeFeed, FeedError, FeedResult, FeedScope, FeedSignal, FeedStream};

use es_core::{AccessToken, ChangeRecord, ChangeSink};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, error::TrySendError};

const DEFAULT_BUFFER: usize = 256;

/// In-process change feed: fans committed changes out to open streams.
///
/// A subscriber whose buffer is full is disconnected rather than blocking
/// the publisher; the consumer sees its stream end and must reconnect.
pub struct MemoryFeed {
    inner: Mutex<FeedInner>,
    buffer: usize,
    unavailable: AtomicBool,
    failing_opens: AtomicU32,
    open_calls: AtomicUsize,
}

struct FeedInner {
    subscribers: HashMap<u64, Subscriber>,
    next_id: u64,
}

struct Subscriber {
    scope: FeedScope,
    sender: mpsc::Sender<FeedSignal>,
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl MemoryFeed {
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Mutex::new(FeedInner {
                subscribers: HashMap::new(),
                next_id: 0,
            }),
            buffer: buffer.max(1),
            unavailable: AtomicBool::new(false),
            failing_opens: AtomicU32::new(0),
            open_calls: AtomicUsize::new(0),
        }
    }

    fn inner(&self) -> MutexGuard<'_, FeedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refuse new streams while unavailable.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Fail the next `count` opens, then recover.
    pub fn fail_next_opens(&self, count: u32) {
        self.failing_opens.store(count, Ordering::SeqCst);
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner();
        inner.subscribers.retain(|_, s| !s.sender.is_closed());
        inner.subscribers.len()
    }

    /// Drop every open stream, as a network partition would.
    pub fn drop_connections(&self) {
        let mut inner = self.inner();
        let count = inner.subscribers.len();
        for (_, subscriber) in inner.subscribers.drain() {
            let _ = subscriber.sender.try_send(FeedSignal::Dropped {
                reason: "connection reset".to_string(),
            });
        }
        info!("Dropped {} change feed connections", count);
    }
}

impl ChangeSink for MemoryFeed {
    fn publish(&self, record: ChangeRecord) {
        let mut inner = self.inner();
        let mut disconnected = Vec::new();

        for (id, subscriber) in inner.subscribers.iter() {
            if !subscriber.scope.matches(&record) {
                continue;
            }
            match subscriber.sender.try_send(FeedSignal::Change(record.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Change feed subscriber {} on {} too slow, disconnecting",
                        id,
                        subscriber.scope.topic()
                    );
                    disconnected.push(*id);
                }
                Err(TrySendError::Closed(_)) => disconnected.push(*id),
            }
        }

        for id in disconnected {
            inner.subscribers.remove(&id);
        }

        debug!(
            "Published {} {} to {} subscribers",
            record.kind,
            record.table,
            inner.subscribers.len()
        );
    }
}

#[async_trait]
impl ChangeFeed for MemoryFeed {
    async fn open(&self, token: &AccessToken, scope: &FeedScope) -> FeedResult<FeedStream> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FeedError::unavailable());
        }
        let failing = self
            .failing_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(FeedError::unavailable());
        }
        if token.is_empty() {
            return Err(FeedError::join_rejected("missing access token"));
        }

        let (sender, stream) = FeedStream::channel(self.buffer);
        let mut inner = self.inner();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(
            id,
            Subscriber {
                scope: scope.clone(),
                sender,
            },
        );

        debug!("Opened change feed {} on {}", id, scope.topic());
        Ok(stream)
    }
}
