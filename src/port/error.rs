//! Port-specific error types.
//!
//! Defines the errors a [`SerialDevice`](super::SerialDevice) reports, separate
//! from the engine taxonomy in [`crate::error`] which wraps them as sources.

use thiserror::Error;

/// Errors that can occur during serial device operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The device accepted fewer bytes than requested.
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// The device went away underneath an open handle.
    #[error("Device disconnected")]
    Disconnected,
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a ShortWrite error.
    pub fn short_write(expected: usize, written: usize) -> Self {
        Self::ShortWrite { expected, written }
    }
}
