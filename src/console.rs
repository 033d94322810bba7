// =============================================================================
// Console Log — Bounded, newest-first activity feed
// =============================================================================

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::types::Category;

/// A single console line.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEntry {
    pub at: DateTime<Local>,
    pub category: Category,
    pub text: String,
}

/// Newest entry sits at index 0. Inserting past `capacity` evicts from the
/// back.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
    /// Every line ever logged, including evicted and cleared ones.
    total_logged: u64,
}

impl ConsoleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_logged: 0,
        }
    }

    /// Stamp `text` with the local wall clock and prepend it.
    pub fn log(&mut self, category: Category, text: impl Into<String>) {
        self.push(ConsoleEntry {
            at: Local::now(),
            category,
            text: text.into(),
        });
    }

    pub fn push(&mut self, entry: ConsoleEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.total_logged += 1;
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

    pub fn total_logged(&self) -> u64 {
        self.total_logged
    }

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ConsoleEntry> {
        self.iter().cloned().collect()
    }
}
