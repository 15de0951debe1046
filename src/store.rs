//! Concurrent per-symbol state.
//!
//! Uses DashMap so feed, poller and engine can read and upsert the same
//! symbol from different tasks without a global lock.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::models::normalize_symbol;

/// Keyed store of the latest value per symbol.
#[derive(Debug)]
pub struct SymbolStore<T> {
    entries: DashMap<String, T>,
}

impl<T: Clone> SymbolStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Atomically insert or update the entry for `symbol` and return a copy
    /// of the stored value. The shard lock is held for the whole closure call.
    pub fn upsert<I, U>(&self, symbol: &str, insert: I, update: U) -> T
    where
        I: FnOnce(&str) -> T,
        U: FnOnce(&mut T),
    {
        let key = normalize_symbol(symbol);
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                update(occupied.get_mut());
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                let value = insert(vacant.key().as_str());
                vacant.insert(value).value().clone()
            }
        }
    }

    /// Insert only when absent.
    pub fn insert_if_absent(&self, symbol: &str, value: T) {
        self.entries
            .entry(normalize_symbol(symbol))
            .or_insert(value);
    }

    pub fn get(&self, symbol: &str) -> Option<T> {
        self.entries
            .get(&normalize_symbol(symbol))
            .map(|r| r.value().clone())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(&normalize_symbol(symbol))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time copy of every entry.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }
}

impl<T: Clone> Default for SymbolStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
