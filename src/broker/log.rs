//! Message log
//!
//! The coordinator's audit trail: human-readable event lines prefixed with a
//! second-resolution wall-clock timestamp. The log is bounded; once it holds
//! `capacity` entries every append evicts the oldest one.

use std::collections::VecDeque;

use chrono::Local;
use tracing::info;

#[derive(Debug)]
pub struct MessageLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl MessageLog {
    /// Number of entries retained when no capacity is configured.
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Timestamp `text` and append it, evicting the oldest entry if full.
    pub fn append(&mut self, text: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        info!(event = text, "message log");
        self.entries.push_back(format!("[{stamp}] {text}"));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Current entries, oldest first.
    pub fn read(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
