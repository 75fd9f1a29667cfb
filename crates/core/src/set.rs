//! Enumerable set with O(1) membership and paginated iteration.
//!
//! Removal swaps the last element into the vacated slot, so iteration order is
//! insertion order only until the first removal.

use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered set backed by a dense vector plus a position index.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> OrderedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value`. Returns false if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.positions.contains_key(&value) {
            return false;
        }
        self.positions.insert(value, self.items.len());
        self.items.push(value);
        true
    }

    /// Remove `value`. Returns false if it was absent.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(index) = self.positions.remove(value) else {
            return false;
        };
        self.items.swap_remove(index);
        if let Some(moved) = self.items.get(index) {
            self.positions.insert(*moved, index);
        }
        true
    }

    /// Membership test.
    pub fn contains(&self, value: &T) -> bool {
        self.positions.contains_key(value)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index` in iteration order.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.get(index).copied()
    }

    /// Iterate in the current order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().copied()
    }

    /// Slice `[start, min(start + count, len))`; empty when `start >= len`.
    pub fn page(&self, start: usize, count: usize) -> Vec<T> {
        if start >= self.items.len() {
            return Vec::new();
        }
        let end = start.saturating_add(count).min(self.items.len());
        self.items[start..end].to_vec()
    }
}
