use crate::{ApplyOutcome, Collection, DisplayOrder, Retention};

use es_core::{ChangeEvent, Entity};

use std::collections::HashSet;

use log::{debug, warn};
use uuid::Uuid;

/// Counts from one snapshot merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub replaced: usize,
    pub rejected: usize,
    pub pruned: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced + self.pruned > 0
    }
}

/// Merges feed events, snapshots and local mutation results into one
/// collection under the same rules, so the outcome does not depend on which
/// path a record arrived by.
pub struct Reconciler<T> {
    collection: Collection<T>,
    retention: Retention,
    seq: u64,
}

impl<T: Entity> Reconciler<T> {
    pub fn new(retention: Retention, order: DisplayOrder) -> Self {
        Self::with_capacity(retention, order, None)
    }

    /// Keep at most `capacity` entries, dropping from the tail of the display order.
    pub fn with_capacity(retention: Retention, order: DisplayOrder, capacity: Option<usize>) -> Self {
        Self {
            collection: Collection::new(order, capacity),
            retention,
            seq: 0,
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Issue mark for a snapshot request: anything applied from now on counts
    /// as newer than the snapshot.
    pub fn mark(&self) -> u64 {
        self.seq
    }

    pub fn apply(&mut self, event: ChangeEvent<T>) -> ApplyOutcome {
        let seq = self.next_seq();
        match event {
            ChangeEvent::Insert(entity) | ChangeEvent::Update(entity) => self.upsert(entity, seq),
            ChangeEvent::Delete(id) => self.delete(id),
        }
    }

    /// Union `rows` into the collection; for exhaustive collections also drop
    /// local entries the snapshot no longer lists, unless they were written
    /// at or after `mark`.
    pub fn merge_snapshot(&mut self, rows: Vec<T>, mark: u64) -> MergeReport {
        let mut report = MergeReport::default();
        let mut listed = HashSet::with_capacity(rows.len());

        for row in rows {
            listed.insert(row.id());
            let seq = self.next_seq();
            match self.upsert(row, seq) {
                ApplyOutcome::Inserted => report.inserted += 1,
                ApplyOutcome::Replaced => report.replaced += 1,
                ApplyOutcome::Rejected => report.rejected += 1,
                _ => {}
            }
        }

        if self.retention == Retention::Exhaustive {
            let pruned = self.collection.prune(&listed, mark);
            for id in &pruned {
                debug!("Pruned {} {} absent from snapshot", T::KIND, id);
            }
            report.pruned = pruned.len();
        }

        report
    }

    pub fn items(&self) -> Vec<T> {
        self.collection.items()
    }

    pub fn head(&self, n: usize) -> Vec<T> {
        self.collection.head(n)
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.collection.get(id)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn upsert(&mut self, entity: T, seq: u64) -> ApplyOutcome {
        let id = entity.id();
        let Some(current) = self.collection.get(id) else {
            if !self.collection.insert(entity, seq) {
                debug!("{} {} is older than the window, not kept", T::KIND, id);
                return ApplyOutcome::Unchanged;
            }
            return ApplyOutcome::Inserted;
        };

        if self.retention == Retention::AppendOnly {
            return ApplyOutcome::Unchanged;
        }

        if !entity.supersedes(current) {
            warn!("Rejected out-of-order {} change for {}", T::KIND, id);
            return ApplyOutcome::Rejected;
        }

        self.collection.replace(entity, seq);
        ApplyOutcome::Replaced
    }

    fn delete(&mut self, id: Uuid) -> ApplyOutcome {
        if self.retention == Retention::AppendOnly {
            return ApplyOutcome::Unchanged;
        }
        match self.collection.remove(id) {
            Some(_) => ApplyOutcome::Removed,
            None => ApplyOutcome::Unchanged,
        }
    }
}
