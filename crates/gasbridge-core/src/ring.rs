//! Bounded, newest-first notification history.

use crate::types::NotificationEntry;
use std::collections::VecDeque;

/// Default number of notifications retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Newest-first ring of notifications. Pushing past capacity evicts the oldest.
#[derive(Debug)]
pub struct NotificationRing {
    entries: VecDeque<NotificationEntry>,
    capacity: usize,
}

impl NotificationRing {
    /// Create an empty ring. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `entry`, evicting the oldest entry when full.
    pub fn push(&mut self, entry: NotificationEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// The newest `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<NotificationEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Drop every entry.
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

impl Default for NotificationRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
