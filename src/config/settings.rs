use serde::Deserialize;

use crate::broker::{MessageLog, Observer};

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub persistence: PersistenceSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the broker core.
///
/// Bounds the coordinator's message log and each observer's received-message
/// buffer.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub log_capacity: usize,
    pub observer_buffer_capacity: usize,
}

/// Which backend holds snapshots.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackend {
    Json,
    Sled,
}

/// Configuration settings for snapshot persistence.
///
/// `path` is the JSON file for the `json` backend and the database directory
/// for `sled`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PersistenceSettings {
    pub backend: SnapshotBackend,
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub persistence: Option<PartialPersistenceSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub log_capacity: Option<usize>,
    pub observer_buffer_capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialPersistenceSettings {
    pub backend: Option<SnapshotBackend>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl PartialSettings {
    /// Fill every missing value from `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let broker = self.broker;
        let persistence = self.persistence;
        let logging = self.logging;

        Settings {
            broker: BrokerSettings {
                log_capacity: broker
                    .as_ref()
                    .and_then(|b| b.log_capacity)
                    .unwrap_or(defaults.broker.log_capacity),
                observer_buffer_capacity: broker
                    .as_ref()
                    .and_then(|b| b.observer_buffer_capacity)
                    .unwrap_or(defaults.broker.observer_buffer_capacity),
            },
            persistence: PersistenceSettings {
                backend: persistence
                    .as_ref()
                    .and_then(|p| p.backend)
                    .unwrap_or(defaults.persistence.backend),
                path: persistence
                    .and_then(|p| p.path)
                    .unwrap_or(defaults.persistence.path),
            },
            logging: LoggingSettings {
                level: logging
                    .and_then(|l| l.level)
                    .unwrap_or(defaults.logging.level),
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings::default(),
            persistence: PersistenceSettings {
                backend: SnapshotBackend::Json,
                path: "config.json".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            log_capacity: MessageLog::DEFAULT_CAPACITY,
            observer_buffer_capacity: Observer::DEFAULT_BUFFER_CAPACITY,
        }
    }
}
