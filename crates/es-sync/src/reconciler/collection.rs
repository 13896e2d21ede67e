use crate::DisplayOrder;

use es_core::Entity;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

struct Slot<T> {
    entity: T,
    /// Sequence at first observation; breaks `order_key` ties.
    arrival: u64,
    /// Sequence at the last write.
    observed: u64,
}

impl<T: Entity> Slot<T> {
    fn sort_key(&self) -> (DateTime<Utc>, u64) {
        (self.entity.order_key(), self.arrival)
    }
}

/// Entities kept sorted by `(order_key, arrival)` in display order.
pub struct Collection<T> {
    slots: Vec<Slot<T>>,
    order: DisplayOrder,
    capacity: Option<usize>,
}

impl<T: Entity> Collection<T> {
    pub fn new(order: DisplayOrder, capacity: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            order,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.slots
            .iter()
            .find(|s| s.entity.id() == id)
            .map(|s| &s.entity)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn items(&self) -> Vec<T> {
        self.slots.iter().map(|s| s.entity.clone()).collect()
    }

    pub fn head(&self, n: usize) -> Vec<T> {
        self.slots
            .iter()
            .take(n)
            .map(|s| s.entity.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.slots.iter().map(|s| s.entity.id()).collect()
    }

    /// Insert a new entity at its display position. Returns false when it
    /// falls outside the capacity window and was not kept.
    pub fn insert(&mut self, entity: T, seq: u64) -> bool {
        let id = entity.id();
        self.place(Slot {
            entity,
            arrival: seq,
            observed: seq,
        });

        if let Some(capacity) = self.capacity
            && self.slots.len() > capacity
        {
            self.slots.truncate(capacity);
            return self.position(id).is_some();
        }
        true
    }

    /// Replace the entity with the same id, keeping its arrival position.
    pub fn replace(&mut self, entity: T, seq: u64) -> bool {
        let Some(index) = self.position(entity.id()) else {
            return false;
        };

        if self.slots[index].entity.order_key() == entity.order_key() {
            let slot = &mut self.slots[index];
            slot.entity = entity;
            slot.observed = seq;
        } else {
            let arrival = self.slots.remove(index).arrival;
            self.place(Slot {
                entity,
                arrival,
                observed: seq,
            });
        }
        true
    }

    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        self.position(id).map(|index| self.slots.remove(index).entity)
    }

    /// Drop entries outside `keep` last written before `mark`; returns their ids.
    pub fn prune(&mut self, keep: &HashSet<Uuid>, mark: u64) -> Vec<Uuid> {
        let mut pruned = Vec::new();
        self.slots.retain(|slot| {
            let id = slot.entity.id();
            if keep.contains(&id) || slot.observed >= mark {
                true
            } else {
                pruned.push(id);
                false
            }
        });
        pruned
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.slots.iter().position(|s| s.entity.id() == id)
    }

    fn place(&mut self, slot: Slot<T>) {
        let key = slot.sort_key();
        let index = match self.order {
            DisplayOrder::NewestFirst => self.slots.partition_point(|s| s.sort_key() > key),
            DisplayOrder::OldestFirst => self.slots.partition_point(|s| s.sort_key() < key),
        };
        self.slots.insert(index, slot);
    }
}
