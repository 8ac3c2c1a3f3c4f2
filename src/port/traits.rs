//! Core trait for serial device abstraction.
//!
//! Defines the `SerialDevice` trait that allows both real serial ports and
//! mock implementations to sit underneath the timed I/O engine.

use super::error::PortError;
use super::modem::ModemStatus;

/// Byte-level access to one open serial device.
///
/// The engine owns all timing: implementations must never block waiting for
/// input in [`try_read`](SerialDevice::try_read). Writes, on the other hand,
/// block until the OS accepts the data.
pub trait SerialDevice: Send + std::fmt::Debug {
    /// Get the name/path of this serial device.
    fn name(&self) -> &str;

    /// Read whatever is already buffered, up to `buffer.len()` bytes.
    ///
    /// Returns `Ok(0)` when no data is available yet. Any `Err` is a hard
    /// failure that the engine reports without retrying.
    fn try_read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Write bytes in a single blocking attempt.
    ///
    /// Returns the number of bytes the device accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Discard unread input buffered by the OS.
    fn flush_input(&mut self) -> Result<(), PortError>;

    /// Number of received bytes buffered by the OS and not yet read.
    fn bytes_available(&self) -> Result<usize, PortError>;

    /// Current state of all modem control and status lines.
    fn modem_status(&mut self) -> Result<ModemStatus, PortError>;

    /// Drive the output lines (DTR, RTS) to match `status`.
    ///
    /// Input-only bits in `status` are ignored.
    fn set_modem_status(&mut self, status: ModemStatus) -> Result<(), PortError>;
}

impl<D: SerialDevice + ?Sized> SerialDevice for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn try_read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).try_read(buffer)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn flush_input(&mut self) -> Result<(), PortError> {
        (**self).flush_input()
    }

    fn bytes_available(&self) -> Result<usize, PortError> {
        (**self).bytes_available()
    }

    fn modem_status(&mut self) -> Result<ModemStatus, PortError> {
        (**self).modem_status()
    }

    fn set_modem_status(&mut self, status: ModemStatus) -> Result<(), PortError> {
        (**self).set_modem_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    #[test]
    fn test_boxed_device_delegates() {
        let mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"abc");

        let mut device: Box<dyn SerialDevice> = Box::new(mock.clone());
        assert_eq!(device.name(), "MOCK0");
        assert_eq!(device.bytes_available().unwrap(), 3);

        let mut buffer = [0u8; 2];
        assert_eq!(device.try_read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer, b"ab");

        device.write_bytes(b"xyz").unwrap();
        assert_eq!(mock.get_write_log(), vec![b"xyz".to_vec()]);
    }
}
