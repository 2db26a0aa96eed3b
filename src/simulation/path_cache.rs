//! Bounded cache of grid paths keyed by (start, end)
//!
//! Eviction is by insertion order: a re-put moves the key to the newest
//! slot, a read does not.

use indexmap::IndexMap;

use super::types::Cell;

/// Cache key: the start and end cells of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathKey {
    pub start: Cell,
    pub end: Cell,
}

impl PathKey {
    pub fn new(start: Cell, end: Cell) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone)]
pub struct PathCache {
    entries: IndexMap<PathKey, Vec<Cell>>,
    capacity: usize,
}

impl PathCache {
    /// A capacity of zero is bumped to one so a put is always observable
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Owned copy of the cached path, if any
    pub fn get(&self, key: &PathKey) -> Option<Vec<Cell>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &PathKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a copy of `path` as the newest entry, evicting the oldest one
    /// if this takes the cache over capacity
    pub fn put(&mut self, key: PathKey, path: &[Cell]) {
        self.entries.shift_remove(&key);
        self.entries.insert(key, path.to_vec());
        if self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
