//! The `utils` module provides shared definitions used across `simplemq`:
//! the error taxonomy and logging setup.

pub mod error;
pub mod logging;

pub use error::{BrokerError, BrokerResult, DeliveryError, EntityKind};
