use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{DataSettings, LoggingSettings, ServerSettings, Settings};

/// Prefix of environment variables that override file settings,
/// e.g. `KEEL__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "KEEL";

/// Loads the application settings.
///
/// Sources are layered, later ones winning: built-in defaults, the TOML file at
/// `path` (skipped when it does not exist), then `KEEL__*` environment
/// variables. The merged result is deserialized into `Settings` and validated.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000_i64)?
        .set_default("server.body_limit_bytes", 10_i64 * 1024 * 1024)?
        .set_default("data.data_dir", "data")?
        .set_default("data.generate_if_missing", true)?
        .set_default("data.securities", 1000_i64)?
        .set_default("data.start_date", "2020-01-01")?
        .set_default("data.end_date", "2025-01-22")?
        .set_default("data.value_low", 1.0)?
        .set_default("data.value_high", 100.0)?
        .set_default("logging.level", "info")?)
}
