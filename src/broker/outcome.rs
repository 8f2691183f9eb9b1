//! Boundary projections
//!
//! External request layers want a success flag and a displayable message
//! rather than a `Result`. `Outcome` is that projection; `Entities` is the
//! serializable listing returned by `Coordinator::list_entities`.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;

use crate::utils::BrokerResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub msg: String,
}

impl Outcome {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            msg: msg.into(),
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: msg.into(),
        }
    }
}

impl<T: Display> From<BrokerResult<T>> for Outcome {
    fn from(result: BrokerResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::ok(value.to_string()),
            Err(e) => Outcome::failed(e.to_string()),
        }
    }
}

/// All registered ids, in creation order, plus every observer's subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entities {
    pub topics: Vec<String>,
    pub producers: Vec<String>,
    pub observers: Vec<String>,
    pub subscriptions: IndexMap<String, Vec<String>>,
}
