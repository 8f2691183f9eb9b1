//! Snapshot store backed by `sled`
//!
//! The snapshot is stored as JSON under a single key of an embedded `sled`
//! database. Every save is flushed before returning.

use std::io;
use std::path::{Path, PathBuf};

use sled::Db;
use tracing::debug;

use crate::persistence::{Snapshot, SnapshotStore};
use crate::utils::{BrokerError, BrokerResult, EntityKind};

const SNAPSHOT_KEY: &[u8] = b"snapshot";

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    path: PathBuf,
}

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: impl AsRef<Path>) -> BrokerResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path).map_err(|e| {
            BrokerError::io(
                format!("failed to open sled database at {}", path.display()),
                storage_error(e),
            )
        })?;
        Ok(Self { db, path })
    }
}

fn storage_error(e: sled::Error) -> io::Error {
    io::Error::other(e.to_string())
}

impl SnapshotStore for SledStore {
    fn save(&self, snapshot: &Snapshot) -> BrokerResult<()> {
        let data = serde_json::to_vec(snapshot)
            .map_err(|e| BrokerError::io("failed to serialize snapshot", io::Error::other(e)))?;

        self.db
            .insert(SNAPSHOT_KEY, data)
            .map_err(|e| BrokerError::io("failed to store snapshot", storage_error(e)))?;
        self.db
            .flush()
            .map_err(|e| BrokerError::io("failed to flush snapshot", storage_error(e)))?;

        debug!(path = %self.path.display(), "snapshot stored in sled");
        Ok(())
    }

    fn load(&self) -> BrokerResult<Snapshot> {
        let stored = self
            .db
            .get(SNAPSHOT_KEY)
            .map_err(|e| BrokerError::io("failed to read snapshot", storage_error(e)))?
            .ok_or_else(|| BrokerError::not_found(EntityKind::Snapshot, self.location()))?;

        let snapshot = serde_json::from_slice(&stored)?;
        Ok(snapshot)
    }

    fn location(&self) -> String {
        format!("sled:{}", self.path.display())
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .field("path", &self.path)
            .finish()
    }
}
