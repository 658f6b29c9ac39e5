use chrono::NaiveDate;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

/// Where and how the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound on request body size.
    pub body_limit_bytes: usize,
}

/// Contains parameters for the parquet dataset store and its dummy-data fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    /// Directory holding one `{data_field}.parquet` file per data field.
    pub data_dir: PathBuf,
    /// Synthesize dummy datasets when a requested file is missing.
    pub generate_if_missing: bool,
    /// Number of security columns in synthesized datasets.
    pub securities: usize,
    /// First calendar day of synthesized datasets.
    pub start_date: NaiveDate,
    /// Last calendar day (inclusive) of synthesized datasets.
    pub end_date: NaiveDate,
    /// Lower bound (inclusive) of synthesized values.
    pub value_low: f64,
    /// Upper bound (exclusive) of synthesized values.
    pub value_high: f64,
    /// Fixes the random generator for reproducible dummy data.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive such as `info` or `keel=debug,tower_http=info`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Settings {
    /// Rejects settings that would only fail later, deep inside a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.data.securities == 0 {
            return Err(ConfigError::ValidationError(
                "data.securities must be at least 1".to_string(),
            ));
        }
        if self.data.start_date > self.data.end_date {
            return Err(ConfigError::ValidationError(format!(
                "data.start_date ({}) is after data.end_date ({})",
                self.data.start_date, self.data.end_date
            )));
        }
        let (low, high) = (self.data.value_low, self.data.value_high);
        if !(low.is_finite() && high.is_finite() && (high - low).is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "data.value_low ({low}) and data.value_high ({high}) must span a finite range"
            )));
        }
        if !(self.data.value_low < self.data.value_high) {
            return Err(ConfigError::ValidationError(format!(
                "data.value_low ({}) must be below data.value_high ({})",
                self.data.value_low, self.data.value_high
            )));
        }
        Ok(())
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid server address: {e}")))
    }
}
