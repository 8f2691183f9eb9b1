//! Producer
//!
//! A producer is only an identity. It never holds topics or observers; each
//! publish looks the topic up in the broker state it is given.

use tracing::debug;

use crate::broker::engine::BrokerState;
use crate::broker::message::{Envelope, Published};
use crate::utils::BrokerResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub id: String,
}

impl Producer {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    pub fn envelope(&self, topic: &str, content: &str) -> Envelope {
        Envelope::new(&self.id, topic, content)
    }

    /// Publish `content` to `topic`.
    ///
    /// Fails with `NotFound` when the topic is unknown, in which case nothing
    /// is delivered and nothing is logged.
    pub fn publish(
        &self,
        state: &mut BrokerState,
        topic: &str,
        content: &str,
    ) -> BrokerResult<Published> {
        state.topic(topic)?;

        let message = self.envelope(topic, content).to_string();
        let deliveries = state.deliver(topic, &message)?;
        debug!(producer = %self.id, topic, subscribers = deliveries.len(), "fan-out complete");

        state.log(&format!(
            "producer {} published to topic '{topic}': {content}",
            self.id
        ));

        Ok(Published {
            message,
            deliveries,
        })
    }
}
