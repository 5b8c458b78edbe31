//! Bounded Store - Byte-Budgeted FIFO Log
//!
//! Holds entries newest-first and keeps their cumulative cost under a fixed
//! budget by dropping the oldest entries.
//!
//! # Design
//!
//! - `VecDeque` with the newest entry at the front: O(1) prepend and O(1) tail eviction
//! - Running size counter adjusted by the exact cost of each admitted/evicted entry
//! - Eviction order is insertion order only; reads never reorder entries
//!
//! An entry larger than the whole budget empties the store and is then admitted
//! alone. That is the only state in which the counter may exceed the budget.

use std::collections::VecDeque;

use super::entry::Entry;

/// Byte-budgeted, newest-first message log
#[derive(Debug, Clone)]
pub struct BoundedStore {
    /// Entries, front = newest
    entries: VecDeque<Entry>,
    /// Sum of `Entry::size` over `entries`
    total_size: u64,
    /// Maximum aggregate cost
    budget: u64,
}

impl BoundedStore {
    /// Create an empty store with the given byte budget
    pub fn new(budget: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            total_size: 0,
            budget,
        }
    }

    /// Admit an entry, evicting the oldest entries first if it would not fit.
    ///
    /// Returns the number of entries evicted.
    pub fn insert(&mut self, entry: Entry) -> usize {
        let cost = entry.size();
        let mut evicted = 0;

        while self.total_size + cost > self.budget {
            let Some(oldest) = self.entries.pop_back() else {
                break;
            };
            self.total_size -= oldest.size();
            evicted += 1;
        }

        self.entries.push_front(entry);
        self.total_size += cost;
        evicted
    }

    /// Number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate cost of all stored entries
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Configured byte budget
    #[inline]
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Most recently inserted entry
    pub fn newest(&self) -> Option<&Entry> {
        self.entries.front()
    }

    /// Oldest remaining entry
    pub fn oldest(&self) -> Option<&Entry> {
        self.entries.back()
    }

    /// Read-only view of the entries in recency order
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            entries: &self.entries,
        }
    }
}

/// Borrowed, read-only view of a [`BoundedStore`]
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    entries: &'a VecDeque<Entry>,
}

impl<'a> Snapshot<'a> {
    /// Entries newest-first
    pub fn newest_first(
        &self,
    ) -> impl DoubleEndedIterator<Item = &'a Entry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Entries oldest-first, without touching the store's own order
    pub fn oldest_first(
        &self,
    ) -> impl DoubleEndedIterator<Item = &'a Entry> + ExactSizeIterator {
        self.entries.iter().rev()
    }

    /// Number of entries in the view
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the view is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
