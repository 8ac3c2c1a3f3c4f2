//! Mock serial device for testing.
//!
//! Provides a `MockSerialPort` that simulates serial device behavior without
//! requiring hardware. Clones share state, so a test can hand one clone to
//! the engine and keep feeding input or inspecting output through another,
//! including from a different thread.

use super::error::PortError;
use super::modem::ModemStatus;
use super::traits::SerialDevice;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Upper bound on bytes handed out per read call.
    max_chunk: Option<usize>,
    /// Log of all writes, one entry per call.
    write_log: Vec<Vec<u8>>,
    /// Accept at most this many bytes on the next write.
    short_write: Option<usize>,
    /// Fail the next read with this error kind.
    fail_next_read: Option<std::io::ErrorKind>,
    /// Fail the next write with this error kind.
    fail_next_write: Option<std::io::ErrorKind>,
    /// Written bytes are appended to the read queue.
    loopback: bool,
    /// Simulates the device being closed out-of-band.
    disconnected: bool,
    modem: ModemStatus,
    read_attempts: usize,
    buffers_cleared: bool,
}

/// Mock serial device for testing.
///
/// This implementation allows you to:
/// - Enqueue input, optionally delivered in small chunks
/// - Inspect what was written
/// - Inject read/write failures and short writes
/// - Loop writes back into the input queue
/// - Drive the modem status lines
///
/// # Example
/// ```
/// use serial_timed_io::port::{MockSerialPort, SerialDevice};
///
/// let mut port = MockSerialPort::new("MOCK0");
///
/// // Enqueue data to be read
/// port.enqueue_read(b"Hello, World!");
///
/// let mut buffer = [0u8; 13];
/// let n = port.try_read(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// // Nothing left: a non-blocking read reports zero bytes
/// assert_eq!(port.try_read(&mut buffer).unwrap(), 0);
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock device with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Create a mock whose writes are echoed back as input.
    pub fn loopback(name: impl Into<String>) -> Self {
        let port = Self::new(name);
        port.state.lock().loopback = true;
        port
    }

    /// Append bytes to the input queue.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Hand out at most `max` bytes per read call (`None` for no limit).
    pub fn set_max_chunk(&self, max: Option<usize>) {
        self.state.lock().max_chunk = max;
    }

    /// Make the next read fail with `kind`.
    pub fn fail_next_read(&self, kind: std::io::ErrorKind) {
        self.state.lock().fail_next_read = Some(kind);
    }

    /// Make the next write fail with `kind`.
    pub fn fail_next_write(&self, kind: std::io::ErrorKind) {
        self.state.lock().fail_next_write = Some(kind);
    }

    /// Accept only `accepted` bytes on the next write.
    pub fn short_next_write(&self, accepted: usize) {
        self.state.lock().short_write = Some(accepted);
    }

    /// Simulate the device being closed underneath the handle. Every
    /// subsequent operation fails with [`PortError::Disconnected`].
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    /// Set the input lines (CTS, DSR, DCD, RI) the peer presents.
    pub fn set_input_lines(&self, lines: ModemStatus) {
        let mut state = self.state.lock();
        for input in [ModemStatus::CTS, ModemStatus::DSR, ModemStatus::DCD, ModemStatus::RI] {
            state.modem.set(input, lines.contains(input));
        }
    }

    /// Current modem lines, without going through the device trait.
    pub fn lines(&self) -> ModemStatus {
        self.state.lock().modem
    }

    /// Get a copy of all data written to the device.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Clear the write log.
    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    /// Number of `try_read` calls made so far.
    pub fn read_attempts(&self) -> usize {
        self.state.lock().read_attempts
    }

    /// Get whether the input buffer has been flushed.
    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Get the number of bytes waiting in the input queue.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }
}

fn io_error(kind: std::io::ErrorKind) -> PortError {
    PortError::Io(std::io::Error::new(kind, "injected failure"))
}

impl SerialDevice for MockSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.read_attempts += 1;

        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        if let Some(kind) = state.fail_next_read.take() {
            return Err(io_error(kind));
        }

        let limit = state.max_chunk.unwrap_or(usize::MAX).min(buffer.len());
        let mut bytes_read = 0;
        while bytes_read < limit {
            match state.read_queue.pop_front() {
                Some(byte) => {
                    buffer[bytes_read] = byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }
        Ok(bytes_read)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        if let Some(kind) = state.fail_next_write.take() {
            return Err(io_error(kind));
        }

        let accepted = state
            .short_write
            .take()
            .map_or(data.len(), |n| n.min(data.len()));
        let written = &data[..accepted];

        state.write_log.push(written.to_vec());
        if state.loopback {
            state.read_queue.extend(written);
        }
        Ok(accepted)
    }

    fn flush_input(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }

    fn bytes_available(&self) -> Result<usize, PortError> {
        let state = self.state.lock();
        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        Ok(state.read_queue.len())
    }

    fn modem_status(&mut self) -> Result<ModemStatus, PortError> {
        let state = self.state.lock();
        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        Ok(state.modem)
    }

    fn set_modem_status(&mut self, status: ModemStatus) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        state.modem.set(ModemStatus::DTR, status.contains(ModemStatus::DTR));
        state.modem.set(ModemStatus::RTS, status.contains(ModemStatus::RTS));
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.try_read(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_empty_read_returns_zero() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];
        assert_eq!(port.try_read(&mut buffer).unwrap(), 0);
        assert_eq!(port.read_attempts(), 1);
    }

    #[test]
    fn test_partial_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.try_read(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_max_chunk_limits_reads() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"abcdef");
        port.set_max_chunk(Some(2));

        let mut buffer = [0u8; 6];
        assert_eq!(port.try_read(&mut buffer).unwrap(), 2);
        assert_eq!(&buffer[..2], b"ab");
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(log[1], b"Test2");
        assert_eq!(port.written_bytes(), b"Test1Test2");
    }

    #[test]
    fn test_short_write() {
        let mut port = MockSerialPort::new("MOCK0");
        port.short_next_write(2);
        assert_eq!(port.write_bytes(b"abcd").unwrap(), 2);
        // only the next write is affected
        assert_eq!(port.write_bytes(b"abcd").unwrap(), 4);
    }

    #[test]
    fn test_injected_read_failure() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"x");
        port.fail_next_read(std::io::ErrorKind::BrokenPipe);

        let mut buffer = [0u8; 1];
        assert!(matches!(port.try_read(&mut buffer), Err(PortError::Io(_))));
        assert_eq!(port.try_read(&mut buffer).unwrap(), 1);
    }

    #[test]
    fn test_loopback_echoes_writes() {
        let mut port = MockSerialPort::loopback("LOOP0");
        port.write_bytes(b"ping").unwrap();
        assert_eq!(port.bytes_available().unwrap(), 4);
    }

    #[test]
    fn test_disconnect_fails_everything() {
        let mut port = MockSerialPort::new("MOCK0");
        port.disconnect();

        let mut buffer = [0u8; 1];
        assert!(matches!(port.try_read(&mut buffer), Err(PortError::Disconnected)));
        assert!(matches!(port.write_bytes(b"x"), Err(PortError::Disconnected)));
        assert!(port.modem_status().is_err());
    }

    #[test]
    fn test_clear_buffers() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Should be cleared");

        port.flush_input().unwrap();
        assert!(port.was_cleared());
        assert_eq!(port.available_bytes(), 0);
    }

    #[test]
    fn test_modem_lines() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_input_lines(ModemStatus::CTS | ModemStatus::DTR);
        // input setter cannot drive outputs
        assert_eq!(port.lines(), ModemStatus::CTS);

        port.set_modem_status(ModemStatus::RTS | ModemStatus::RI).unwrap();
        // output setter cannot drive inputs
        assert_eq!(port.modem_status().unwrap(), ModemStatus::CTS | ModemStatus::RTS);
    }
}
