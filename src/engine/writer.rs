//! Blocking writers.

use super::SerialHandle;
use crate::error::{EngineError, EngineResult};
use crate::port::{PortError, SerialDevice};
use crate::timer::Clock;
use tracing::{trace, warn};

impl<D: SerialDevice, C: Clock> SerialHandle<D, C> {
    /// Write a single byte.
    pub fn write_byte(&mut self, byte: u8) -> EngineResult<()> {
        self.write_bytes(&[byte])
    }

    /// Write `data` in one blocking attempt.
    ///
    /// Succeeds only if the device accepts every byte. A short write or a
    /// device error is [`EngineError::WriteFailed`]; nothing is retried.
    pub fn write_bytes(&mut self, data: &[u8]) -> EngineResult<()> {
        let written = self.device.write_bytes(data).map_err(|e| {
            warn!("Write to {} failed: {}", self.device.name(), e);
            EngineError::WriteFailed(e)
        })?;

        if written != data.len() {
            warn!(
                "Short write to {}: {} of {} bytes",
                self.device.name(),
                written,
                data.len()
            );
            return Err(EngineError::WriteFailed(PortError::short_write(
                data.len(),
                written,
            )));
        }

        trace!("Wrote {} bytes to {}", written, self.device.name());
        Ok(())
    }

    /// Write the UTF-8 bytes of `text`.
    pub fn write_str(&mut self, text: &str) -> EngineResult<()> {
        self.write_bytes(text.as_bytes())
    }
}
