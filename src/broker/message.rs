//! Message definitions for the broker
//!
//! `Envelope` is what a producer hands to a topic: the producer id, the
//! wall-clock time of publication and the content. Its `Display` form is the
//! text observers store and the text returned to the publisher.

use std::fmt;

use chrono::{DateTime, Local};

use crate::broker::topic::DeliveryReport;

#[derive(Debug, Clone)]
pub struct Envelope {
    pub producer_id: String,
    pub topic: String,
    pub content: String,
    pub published_at: DateTime<Local>,
}

impl Envelope {
    pub fn new(producer_id: &str, topic: &str, content: &str) -> Self {
        Self {
            producer_id: producer_id.to_string(),
            topic: topic.to_string(),
            content: content.to_string(),
            published_at: Local::now(),
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[producer {}][{}] {}",
            self.producer_id,
            self.published_at.format("%H:%M:%S"),
            self.content
        )
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone)]
pub struct Published {
    /// The formatted message as delivered to subscribers.
    pub message: String,
    pub deliveries: Vec<DeliveryReport>,
}

impl Published {
    pub fn delivered_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.deliveries.len() - self.delivered_count()
    }
}

impl fmt::Display for Published {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message published: {}", self.message)?;
        let failed = self.failed_count();
        if failed > 0 {
            write!(f, " ({failed} of {} deliveries failed)", self.deliveries.len())?;
        }
        Ok(())
    }
}
