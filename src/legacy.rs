//! Process-wide single-device API.
//!
//! Some callers expect a driver with one implicit active device instead of an
//! explicit handle. These functions keep one [`SerialHandle`] behind a global
//! mutex and forward to it; every call fails with [`EngineError::NotOpen`]
//! while nothing is open. Calls from different threads are serialised by the
//! mutex, so a long blocking read holds off every other call until it returns.

use crate::engine::{BlockRead, ByteRead, SerialHandle, StringRead};
use crate::error::{EngineError, EngineResult};
use crate::port::{LineSettings, SerialDevice};
use crate::timer::Timeout;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::info;

type ActiveHandle = SerialHandle<Box<dyn SerialDevice>>;

static ACTIVE: Lazy<Mutex<Option<ActiveHandle>>> = Lazy::new(|| Mutex::new(None));

fn with_active<T>(f: impl FnOnce(&mut ActiveHandle) -> EngineResult<T>) -> EngineResult<T> {
    let mut guard = ACTIVE.lock();
    let handle = guard.as_mut().ok_or(EngineError::NotOpen)?;
    f(handle)
}

/// Open `path` and make it the active device.
///
/// The new device is opened before the previous one is closed, so a failed
/// open leaves the current device active.
pub fn open(path: &str, settings: &LineSettings) -> EngineResult<()> {
    let handle = SerialHandle::open(path, settings)?;
    install(Box::new(handle.into_device()));
    Ok(())
}

/// Make `device` the active device, closing any previous one.
pub fn install(device: Box<dyn SerialDevice>) {
    let mut guard = ACTIVE.lock();
    if let Some(previous) = guard.take() {
        previous.close();
    }
    info!("Active serial device is now {}", device.name());
    *guard = Some(SerialHandle::new(device));
}

/// Close the active device. Closing when nothing is open is a no-op.
pub fn close() {
    if let Some(handle) = ACTIVE.lock().take() {
        handle.close();
    }
}

pub fn is_open() -> bool {
    ACTIVE.lock().is_some()
}

pub fn read_byte(timeout: Timeout) -> EngineResult<ByteRead> {
    with_active(|h| h.read_byte(timeout))
}

pub fn read_string(terminator: u8, buf: &mut [u8], timeout: Timeout) -> EngineResult<StringRead> {
    with_active(|h| h.read_string(terminator, buf, timeout))
}

pub fn read_bytes(
    buf: &mut [u8],
    timeout: Timeout,
    poll_interval: Duration,
) -> EngineResult<BlockRead> {
    with_active(|h| h.read_bytes(buf, timeout, poll_interval))
}

pub fn write_byte(byte: u8) -> EngineResult<()> {
    with_active(|h| h.write_byte(byte))
}

pub fn write_bytes(data: &[u8]) -> EngineResult<()> {
    with_active(|h| h.write_bytes(data))
}

pub fn write_str(text: &str) -> EngineResult<()> {
    with_active(|h| h.write_str(text))
}

pub fn flush_input() -> EngineResult<()> {
    with_active(|h| h.flush_input())
}

pub fn available() -> EngineResult<usize> {
    with_active(|h| h.available())
}

pub fn set_dtr(level: bool) -> EngineResult<()> {
    with_active(|h| h.set_dtr(level))
}

pub fn set_rts(level: bool) -> EngineResult<()> {
    with_active(|h| h.set_rts(level))
}

pub fn dtr() -> EngineResult<bool> {
    with_active(|h| h.dtr())
}

pub fn rts() -> EngineResult<bool> {
    with_active(|h| h.rts())
}

pub fn cts() -> EngineResult<bool> {
    with_active(|h| h.cts())
}

pub fn dsr() -> EngineResult<bool> {
    with_active(|h| h.dsr())
}

pub fn dcd() -> EngineResult<bool> {
    with_active(|h| h.dcd())
}

pub fn ri() -> EngineResult<bool> {
    with_active(|h| h.ri())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_calls_without_device_fail() {
        close();
        assert!(!is_open());
        assert!(matches!(write_byte(1), Err(EngineError::NotOpen)));
        assert!(matches!(
            read_byte(Timeout::from_millis(1)),
            Err(EngineError::NotOpen)
        ));
    }

    #[test]
    #[serial]
    fn test_install_forwards_to_device() {
        let mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(b"hi\n");
        install(Box::new(mock.clone()));
        assert!(is_open());

        let mut buf = [0u8; 8];
        let outcome = read_string(b'\n', &mut buf, Timeout::from_millis(100)).unwrap();
        assert_eq!(outcome, StringRead::Terminated(3));

        write_str("ack").unwrap();
        assert_eq!(mock.written_bytes(), b"ack");

        close();
        assert!(!is_open());
    }

    #[test]
    #[serial]
    fn test_install_replaces_previous() {
        let first = MockSerialPort::new("FIRST");
        let second = MockSerialPort::new("SECOND");
        install(Box::new(first.clone()));
        install(Box::new(second.clone()));

        write_byte(b'!').unwrap();
        assert!(first.get_write_log().is_empty());
        assert_eq!(second.written_bytes(), b"!");
        close();
    }
}
