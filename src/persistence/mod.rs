//! The `persistence` module saves and restores coordinator snapshots.
//!
//! A [`Snapshot`] captures entity ids and the subscription mapping; it does
//! not capture the message log or observer buffers. Snapshots are written
//! only on an explicit save.
//!
//! Two backends implement [`SnapshotStore`]:
//! - [`JsonFileStore`]: a pretty-printed JSON file (the default).
//! - [`SledStore`]: a single key in an embedded `sled` database.

pub mod json_store;
pub mod sled_store;
pub mod snapshot;

use std::fmt::Debug;

use crate::utils::BrokerResult;

pub use json_store::JsonFileStore;
pub use sled_store::SledStore;
pub use snapshot::Snapshot;

/// Storage for a single snapshot.
pub trait SnapshotStore: Debug + Send + Sync {
    /// Persist `snapshot`, replacing any previous one.
    fn save(&self, snapshot: &Snapshot) -> BrokerResult<()>;

    /// Read the stored snapshot. Fails with `NotFound` if none was saved.
    fn load(&self) -> BrokerResult<Snapshot>;

    /// Human-readable location, used in log entries.
    fn location(&self) -> String;
}
