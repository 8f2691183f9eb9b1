//! # SimpleMQ
//!
//! `simplemq` is a minimal in-memory publish/subscribe broker. Producers
//! publish messages to named topics, observers subscribe to topics and keep
//! the messages delivered to them, and a coordinator tracks every entity,
//! every subscription and a bounded audit log. State can be saved to and
//! restored from a snapshot on explicit request.
//!
//! ## Core Modules
//!
//! - `broker`: the `Coordinator`, registries, subscription relation, delivery and message log.
//! - `persistence`: snapshot format and the JSON-file and `sled` snapshot stores.
//! - `config`: loading settings from files and the environment.
//! - `shell`: the line-oriented command front end used by the binary.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod config;
pub mod persistence;
pub mod shell;
pub mod utils;
