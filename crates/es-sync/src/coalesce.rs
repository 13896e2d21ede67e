use crate::{SyncError, SyncResult};

use es_core::ErrorKind;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::debug;

#[derive(Debug, Clone)]
struct SharedFailure {
    kind: ErrorKind,
    message: String,
}

type InFlight<V> = Shared<BoxFuture<'static, Result<V, SharedFailure>>>;
type InFlightMap<V> = Arc<Mutex<HashMap<String, (u64, InFlight<V>)>>>;

/// Joins concurrent identical requests onto a single in-flight future.
///
/// The first caller for a key starts the request; callers arriving while it
/// is pending await the same result. The entry is removed once the starting
/// caller finishes or is cancelled, so later calls go to the remote again.
pub struct Coalescer<V> {
    inflight: InFlightMap<V>,
    next_id: AtomicU64,
    joined: AtomicUsize,
}

impl<V> Default for Coalescer<V> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            joined: AtomicUsize::new(0),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Coalescer<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F>(&self, key: String, start: F) -> SyncResult<V>
    where
        F: FnOnce() -> BoxFuture<'static, SyncResult<V>>,
    {
        let (request, _leader) = {
            let mut inflight = lock(&self.inflight);
            match inflight.get(&key) {
                Some((_, existing)) => {
                    self.joined.fetch_add(1, Ordering::SeqCst);
                    debug!("Joining in-flight request {}", key);
                    (existing.clone(), None)
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let request = start()
                        .map(|result| {
                            result.map_err(|e| SharedFailure {
                                kind: e.kind(),
                                message: e.to_string(),
                            })
                        })
                        .boxed()
                        .shared();
                    inflight.insert(key.clone(), (id, request.clone()));
                    let leader = LeaderGuard {
                        inflight: Arc::clone(&self.inflight),
                        key,
                        id,
                    };
                    (request, Some(leader))
                }
            }
        };

        request
            .await
            .map_err(|failure| SyncError::shared(failure.kind, failure.message))
    }

    /// Number of calls that joined an existing request.
    pub fn joined(&self) -> usize {
        self.joined.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.inflight).len()
    }
}

fn lock<V>(map: &InFlightMap<V>) -> MutexGuard<'_, HashMap<String, (u64, InFlight<V>)>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

struct LeaderGuard<V> {
    inflight: InFlightMap<V>,
    key: String,
    id: u64,
}

impl<V> Drop for LeaderGuard<V> {
    fn drop(&mut self) {
        let mut inflight = lock(&self.inflight);
        if inflight.get(&self.key).is_some_and(|(id, _)| *id == self.id) {
            inflight.remove(&self.key);
        }
    }
}
