//! Entity registry
//!
//! A `Registry` maps caller-supplied string ids to entities in insertion
//! order, so listings and snapshots come out in creation order. Ids are
//! unique; inserting a duplicate is an error.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::utils::{BrokerError, BrokerResult, EntityKind};

#[derive(Debug)]
pub struct Registry<T> {
    kind: EntityKind,
    entries: IndexMap<String, T>,
}

impl<T> Registry<T> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Insert `value` under `id`. Fails with `AlreadyExists` if the id is taken.
    pub fn insert(&mut self, id: &str, value: T) -> BrokerResult<()> {
        match self.entries.entry(id.to_string()) {
            Entry::Occupied(_) => Err(BrokerError::already_exists(self.kind, id)),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &str) -> BrokerResult<&T> {
        self.entries
            .get(id)
            .ok_or_else(|| BrokerError::not_found(self.kind, id))
    }

    pub fn get_mut(&mut self, id: &str) -> BrokerResult<&mut T> {
        let kind = self.kind;
        self.entries
            .get_mut(id)
            .ok_or_else(|| BrokerError::not_found(kind, id))
    }

    /// Remove `id`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, id: &str) -> BrokerResult<T> {
        self.entries
            .shift_remove(id)
            .ok_or_else(|| BrokerError::not_found(self.kind, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
