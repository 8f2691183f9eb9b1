mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    BrokerSettings, LoggingSettings, PersistenceSettings, Settings, SnapshotBackend,
};

/// Prefix for environment overrides, e.g. `SIMPLEMQ_BROKER__LOG_CAPACITY`.
pub const ENV_PREFIX: &str = "SIMPLEMQ";

/// Loads the configuration from the default file, an optional explicit file
/// and environment variables, in increasing order of precedence.
/// Missing values are filled from `Settings::default()`.
pub fn load_config(file: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
