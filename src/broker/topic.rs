//! Topic delivery
//!
//! A `Topic` is a named channel. It does not store its subscribers; the
//! coordinator resolves them from the subscription index and passes each one
//! to [`Topic::deliver`] in subscription order.
//!
//! Delivery is isolated per subscriber: each subscriber gets its own
//! [`DeliveryReport`] and a failing subscriber does not stop delivery to the
//! ones after it.

use tracing::{debug, warn};

use crate::utils::DeliveryError;

/// Anything that can receive a message published to a topic.
pub trait Subscriber {
    fn id(&self) -> &str;

    fn receive(&mut self, message: &str, topic: &str) -> Result<Receipt, DeliveryError>;
}

/// Result of a successful hand-off to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    Stored,
    /// Stored, but the subscriber's bounded buffer dropped its oldest record.
    StoredWithEviction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    DeliveredWithEviction,
    Failed(DeliveryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub subscriber: String,
    pub status: DeliveryStatus,
}

impl DeliveryReport {
    pub fn failed(subscriber: &str, error: DeliveryError) -> Self {
        Self {
            subscriber: subscriber.to_string(),
            status: DeliveryStatus::Failed(error),
        }
    }

    pub fn is_delivered(&self) -> bool {
        !matches!(self.status, DeliveryStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Deliver `message` to one subscriber and report how it went. A failure
    /// is contained in the report.
    pub fn deliver<S>(&self, message: &str, subscriber: &mut S) -> DeliveryReport
    where
        S: Subscriber + ?Sized,
    {
        let status = match subscriber.receive(message, &self.name) {
            Ok(Receipt::Stored) => DeliveryStatus::Delivered,
            Ok(Receipt::StoredWithEviction) => {
                warn!(
                    topic = %self.name,
                    subscriber = subscriber.id(),
                    "subscriber buffer full, oldest message evicted"
                );
                DeliveryStatus::DeliveredWithEviction
            }
            Err(e) => {
                warn!(topic = %self.name, subscriber = subscriber.id(), "delivery failed: {e}");
                DeliveryStatus::Failed(e)
            }
        };
        debug!(topic = %self.name, subscriber = subscriber.id(), ?status, "delivered");
        DeliveryReport {
            subscriber: subscriber.id().to_string(),
            status,
        }
    }
}
