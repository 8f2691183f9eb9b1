pub mod engine;
pub mod log;
pub mod message;
pub mod observer;
pub mod outcome;
pub mod producer;
pub mod registry;
pub mod subscription;
pub mod topic;

pub use engine::{BrokerState, Coordinator};
pub use log::MessageLog;
pub use message::{Envelope, Published};
pub use observer::Observer;
pub use outcome::{Entities, Outcome};
pub use producer::Producer;
pub use topic::{DeliveryReport, DeliveryStatus, Receipt, Subscriber, Topic};

#[cfg(test)]
mod tests;
