//! Engine-level error taxonomy.
//!
//! Every failure the engine can report is a variant of [`EngineError`].
//! Timeouts and buffer exhaustion during reads are *outcomes* (see
//! [`crate::engine::outcome`]), not errors; `BufferFull` exists here only for
//! callers that choose to escalate it via [`crate::StringRead::into_line`].

use crate::port::PortError;
use std::fmt;
use thiserror::Error;

/// The line parameter that the configuration mapper refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Speed,
    DataBits,
    StopBits,
    Parity,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Speed => "speed",
            Self::DataBits => "data bits",
            Self::StopBits => "stop bits",
            Self::Parity => "parity",
        };
        f.write_str(name)
    }
}

/// Which side of the line-attribute exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeStage {
    Read,
    Write,
}

impl fmt::Display for AttributeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Errors surfaced by the timed I/O engine and its open/configure path.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The device path does not exist.
    #[error("Serial device not found: {0}")]
    NotFound(String),

    /// The device exists but could not be opened.
    #[error("Failed to open serial device '{path}': {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: PortError,
    },

    /// A requested line parameter is outside the supported set.
    #[error("Unsupported {field}: {value}")]
    ConfigRejected { field: ConfigField, value: String },

    /// Reading or writing the device's line attributes failed.
    #[error("Failed to {stage} line attributes: {source}")]
    AttributeIoFailed {
        stage: AttributeStage,
        #[source]
        source: PortError,
    },

    /// The device refused the non-blocking read timeout setup.
    #[error("Failed to configure read timeouts: {0}")]
    TimeoutSetFailed(#[source] PortError),

    /// The device reported a hard error while reading.
    #[error("Read failed: {0}")]
    ReadFailed(#[source] PortError),

    /// The device failed to accept the full write.
    #[error("Write failed: {0}")]
    WriteFailed(#[source] PortError),

    /// A string read filled its buffer without seeing the terminator.
    #[error("Buffer full after {0} bytes without terminator")]
    BufferFull(usize),

    /// Modem-status, flush or input-count control failed.
    #[error("Line control failed: {0}")]
    LineControlFailed(#[source] PortError),

    /// No device is bound to the process-wide legacy handle.
    #[error("No serial device is open")]
    NotOpen,

    /// The platform clock could not be read.
    #[error("Clock unavailable: {0}")]
    Clock(String),
}

impl EngineError {
    /// Create a `ConfigRejected` error for the given field and offending value.
    pub fn rejected(field: ConfigField, value: impl fmt::Display) -> Self {
        Self::ConfigRejected {
            field,
            value: value.to_string(),
        }
    }

    /// The rejected field, if this is a configuration rejection.
    pub fn config_field(&self) -> Option<ConfigField> {
        match self {
            Self::ConfigRejected { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// The negative status code the C driver returned for the same failure.
    ///
    /// Codes overlap between operations (the open path and the read path both
    /// use `-2`, for instance), so the value is only meaningful together with
    /// the operation that produced it.
    pub fn legacy_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => -1,
            Self::OpenFailed { .. } => -2,
            Self::AttributeIoFailed {
                stage: AttributeStage::Read,
                ..
            } => -3,
            Self::ConfigRejected {
                field: ConfigField::Speed,
                ..
            } => -4,
            Self::AttributeIoFailed {
                stage: AttributeStage::Write,
                ..
            } => -5,
            Self::TimeoutSetFailed(_) => -6,
            Self::ConfigRejected {
                field: ConfigField::DataBits,
                ..
            } => -7,
            Self::ConfigRejected {
                field: ConfigField::StopBits,
                ..
            } => -8,
            Self::ConfigRejected {
                field: ConfigField::Parity,
                ..
            } => -9,
            Self::ReadFailed(_) => -2,
            Self::BufferFull(_) => -3,
            Self::WriteFailed(_) | Self::LineControlFailed(_) | Self::NotOpen | Self::Clock(_) => {
                -1
            }
        }
    }
}

/// A specialized `Result` type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
