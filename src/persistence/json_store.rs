//! JSON file snapshot store
//!
//! Writes go to a uniquely named temp file next to the target and are then
//! renamed over it, so a failed save never leaves a half-written snapshot.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use crate::persistence::{Snapshot, SnapshotStore};
use crate::utils::{BrokerError, BrokerResult, EntityKind};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4()))
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new("config.json")
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &Snapshot) -> BrokerResult<()> {
        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| BrokerError::io("failed to serialize snapshot", io::Error::other(e)))?;

        let tmp = self.temp_path();
        fs::write(&tmp, data)
            .map_err(|e| BrokerError::io(format!("failed to write {}", tmp.display()), e))?;

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(BrokerError::io(
                format!("failed to replace {}", self.path.display()),
                e,
            ));
        }

        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }

    fn load(&self) -> BrokerResult<Snapshot> {
        if !self.path.exists() {
            return Err(BrokerError::not_found(EntityKind::Snapshot, self.location()));
        }

        let text = fs::read_to_string(&self.path)
            .map_err(|e| BrokerError::io(format!("failed to read {}", self.path.display()), e))?;
        let snapshot = serde_json::from_str(&text)?;
        Ok(snapshot)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
