use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Capacity used when none is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Bounded, append-only log of timestamped lines. The oldest line is evicted
/// once capacity is exceeded.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `message` stamped with `at`; returns the stored line.
    pub fn push(&mut self, at: DateTime<Utc>, message: &str) -> &str {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(format!("[{}] {message}", at.format("%Y-%m-%d %H:%M:%S")));
        self.entries.back().map(String::as_str).unwrap_or_default()
    }

    /// Current contents, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
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
