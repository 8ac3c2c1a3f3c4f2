//! Errors raised while loading, validating or saving `serial-timed-io.toml`.

use crate::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file is missing
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    /// `[device]` asks for a line the device layer cannot set up
    #[error("Rejected [device] line settings: {0}")]
    LineSettings(#[source] EngineError),

    /// A value outside the range the read loops accept
    #[error("Invalid value for '{key}': {reason}")]
    OutOfRange { key: &'static str, reason: &'static str },

    /// A `SERIAL_TIMED_IO_*` override that does not parse
    #[error("Cannot parse {var}={value:?}: {reason}")]
    Env {
        var: String,
        value: String,
        reason: String,
    },

    /// `save()` on a loader that was never backed by a file
    #[error("No configuration file to save to")]
    NoPath,
}

impl ConfigError {
    /// The integer code a legacy caller would see for this failure.
    ///
    /// Rejected line settings keep the code the mapper assigns (-4 for an
    /// unsupported speed, -7/-8/-9 for data bits, stop bits, parity); every
    /// other configuration problem is a generic -1.
    pub fn legacy_code(&self) -> i32 {
        match self {
            Self::LineSettings(e) => e.legacy_code(),
            _ => -1,
        }
    }

    pub(crate) fn env(var: String, value: String, reason: impl ToString) -> Self {
        Self::Env {
            var,
            value,
            reason: reason.to_string(),
        }
    }
}

impl From<EngineError> for ConfigError {
    fn from(err: EngineError) -> Self {
        Self::LineSettings(err)
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
