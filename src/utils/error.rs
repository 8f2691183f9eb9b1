//! The `error` module defines the error taxonomy shared by every `simplemq`
//! component.
//!
//! Core operations never panic across the coordinator boundary; they return a
//! [`BrokerResult`] whose error text names the entity kind and the offending
//! id, so callers can show it to a user without translation.

use std::fmt;

use thiserror::Error;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Topic,
    Producer,
    Observer,
    Snapshot,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Topic => "topic",
            EntityKind::Producer => "producer",
            EntityKind::Observer => "observer",
            EntityKind::Snapshot => "snapshot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot is corrupt: {0}")]
    CorruptSnapshot(#[from] serde_json::Error),
}

impl BrokerError {
    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        BrokerError::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        BrokerError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BrokerError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;

/// Failure to hand a message to a single subscriber. Reported per subscriber;
/// never aborts a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber '{0}' is not registered")]
    Unregistered(String),

    #[error("subscriber '{id}' rejected the message: {reason}")]
    Rejected { id: String, reason: String },
}
