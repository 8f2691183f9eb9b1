//! Observer
//!
//! An `Observer` records every message delivered to it as
//! `"[topic=<topic>] <message>"`. The buffer is a ring bounded by the
//! configured capacity; when it is full the oldest record is dropped and the
//! delivery reports the eviction.
//!
//! Which topics an observer is subscribed to is not stored here; see
//! `SubscriptionIndex`.

use std::collections::VecDeque;

use crate::broker::topic::{Receipt, Subscriber};
use crate::utils::DeliveryError;

#[derive(Debug, Clone)]
pub struct Observer {
    id: String,
    received: VecDeque<String>,
    capacity: usize,
}

impl Observer {
    pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

    pub fn new(id: &str) -> Self {
        Self::with_capacity(id, Self::DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(id: &str, capacity: usize) -> Self {
        Self {
            id: id.to_string(),
            received: VecDeque::new(),
            capacity,
        }
    }

    /// Received records, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.received.iter().cloned().collect()
    }
}

impl Subscriber for Observer {
    fn id(&self) -> &str {
        &self.id
    }

    fn receive(&mut self, message: &str, topic: &str) -> Result<Receipt, DeliveryError> {
        if self.capacity == 0 {
            return Err(DeliveryError::Rejected {
                id: self.id.clone(),
                reason: "message buffer is disabled".to_string(),
            });
        }

        self.received.push_back(format!("[topic={topic}] {message}"));
        if self.received.len() > self.capacity {
            self.received.pop_front();
            return Ok(Receipt::StoredWithEviction);
        }
        Ok(Receipt::Stored)
    }
}
