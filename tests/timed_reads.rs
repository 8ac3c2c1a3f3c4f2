//! Integration tests for the timed read engine.
//!
//! Covers the timing and capacity guarantees of the byte, string and block
//! readers against the mock device:
//! - Finite timeouts are honoured within one poll granularity
//! - A zero timeout waits forever
//! - String reads never overrun and report full buffers
//! - Block reads return partial counts on timeout
//! - Written data reads back unchanged through a loopback device
//!
//! Tests follow the Arrange-Act-Assert pattern.

mod common;

use common::{create_mock_port_with_input, deliver_later, stepped_handle};
use pretty_assertions::assert_eq;
use serial_timed_io::port::{DataBits, LineSettings, MockSerialPort, PortError};
use serial_timed_io::{
    BlockRead, ByteRead, ConfigField, EngineError, IdlePolicy, SerialHandle, StringRead, Timeout,
};
use std::time::{Duration, Instant};

/// Scheduling slack allowed on top of a deadline with the real clock.
const SLACK: Duration = Duration::from_millis(250);

// ============================================================================
// Byte Reader
// ============================================================================

#[test]
fn test_read_byte_finite_timeout_is_honoured() {
    // Arrange: an idle device and the real monotonic clock
    let mock = MockSerialPort::new("MOCK0");
    let mut handle = SerialHandle::new(mock).with_idle_policy(IdlePolicy::Yield);
    let timeout = Duration::from_millis(30);

    // Act
    let started = Instant::now();
    let outcome = handle.read_byte(Timeout::from_millis(30)).unwrap();
    let elapsed = started.elapsed();

    // Assert: timed out no earlier than the deadline and not much later
    assert_eq!(outcome, ByteRead::TimedOut);
    assert!(elapsed >= timeout, "returned early after {:?}", elapsed);
    assert!(elapsed < timeout + SLACK, "overshot deadline: {:?}", elapsed);
}

#[test]
fn test_read_byte_zero_timeout_waits_for_data() {
    // Arrange: data arrives only after a delay
    let mock = MockSerialPort::new("MOCK0");
    let mut handle = SerialHandle::new(mock.clone()).with_idle_policy(IdlePolicy::Yield);
    let started = Instant::now();
    let feeder = deliver_later(&mock, Duration::from_millis(60), b"!");

    // Act: 0 means "wait indefinitely", not "return immediately"
    let outcome = handle.read_byte(Timeout::INFINITE).unwrap();

    // Assert
    feeder.join().unwrap();
    assert_eq!(outcome, ByteRead::Byte(b'!'));
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_read_byte_fails_when_device_disappears() {
    // Arrange: an infinite read on an idle device
    let mock = MockSerialPort::new("MOCK0");
    let mut handle = SerialHandle::new(mock.clone()).with_idle_policy(IdlePolicy::Yield);
    let remote = mock.clone();
    let closer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.disconnect();
    });

    // Act
    let result = handle.read_byte(Timeout::INFINITE);

    // Assert: an out-of-band close fails the read instead of hanging
    closer.join().unwrap();
    assert!(matches!(
        result,
        Err(EngineError::ReadFailed(PortError::Disconnected))
    ));
}

#[test]
fn test_read_byte_polls_once_per_step() {
    // Arrange
    let mock = MockSerialPort::new("MOCK0");
    let (mut handle, _clock) = stepped_handle(&mock);

    // Act
    let outcome = handle.read_byte(Timeout::from_millis(10)).unwrap();

    // Assert: one clock sample per poll means exactly nine empty polls
    assert_eq!(outcome, ByteRead::TimedOut);
    assert_eq!(mock.read_attempts(), 9);
}

// ============================================================================
// String Reader
// ============================================================================

#[test]
fn test_read_string_ok_line() {
    // Arrange
    let mock = create_mock_port_with_input("MOCK0", b"OK\n");
    let mut handle = SerialHandle::new(mock);
    let mut buf = [0u8; 10];

    // Act
    let outcome = handle
        .read_string(b'\n', &mut buf, Timeout::from_millis(1000))
        .unwrap();

    // Assert: three bytes consumed including the terminator
    assert_eq!(outcome, StringRead::Terminated(3));
    assert_eq!(&buf[..outcome.len()], b"OK\n");
}

#[test]
fn test_read_string_buffer_full_without_overrun() {
    // Arrange: twelve bytes, none of them the terminator, into an
    // eight-byte window of a larger array
    let mock = create_mock_port_with_input("MOCK0", b"ABCDEFGHIJKL");
    let mut handle = SerialHandle::new(mock.clone());
    let mut storage = [0xEEu8; 16];

    // Act
    let outcome = handle
        .read_string(b'\n', &mut storage[..8], Timeout::INFINITE)
        .unwrap();

    // Assert
    assert_eq!(outcome, StringRead::BufferFull(8));
    assert_eq!(&storage[..8], b"ABCDEFGH");
    assert_eq!(&storage[8..], &[0xEE; 8]);
    assert_eq!(mock.available_bytes(), 4);
    assert!(matches!(
        outcome.into_line(),
        Err(EngineError::BufferFull(8))
    ));
}

#[test]
fn test_read_string_deadline_bounds_trickling_input() {
    // Arrange: plenty of non-terminator input is always available
    let mock = create_mock_port_with_input("MOCK0", &[b'x'; 100]);
    let (mut handle, clock) = stepped_handle(&mock);
    let mut buf = [0u8; 100];

    // Act
    let outcome = handle
        .read_string(b'\n', &mut buf, Timeout::from_millis(5))
        .unwrap();

    // Assert: the overall deadline stops the read long before the buffer
    // fills, and simulated time stays close to the deadline
    assert!(matches!(outcome, StringRead::TimedOut(n) if n < 100));
    assert!(clock.elapsed() <= Duration::from_millis(8));
}

#[test]
fn test_read_string_timeout_keeps_partial_data() {
    // Arrange
    let mock = MockSerialPort::new("MOCK0");
    let mut handle = SerialHandle::new(mock.clone()).with_idle_policy(IdlePolicy::Yield);
    mock.enqueue_read(b"PART");
    let mut buf = [0u8; 32];

    // Act
    let started = Instant::now();
    let outcome = handle
        .read_string(b'\n', &mut buf, Timeout::from_millis(40))
        .unwrap();

    // Assert
    assert_eq!(outcome, StringRead::TimedOut(4));
    assert_eq!(&buf[..4], b"PART");
    assert!(started.elapsed() < Duration::from_millis(40) + SLACK);
}

#[test]
fn test_read_line_with_sleep_policy() {
    // Arrange
    let mock = MockSerialPort::new("MOCK0");
    let mut handle = SerialHandle::new(mock.clone())
        .with_idle_policy(IdlePolicy::Sleep(Duration::from_micros(200)));
    let feeder = deliver_later(&mock, Duration::from_millis(10), b"READY\r\n");

    // Act
    let line = handle
        .read_line(b'\n', 64, Timeout::from_millis(2000))
        .unwrap();

    // Assert
    feeder.join().unwrap();
    assert_eq!(line.outcome, StringRead::Terminated(7));
    assert_eq!(line.text(), "READY\r");
}

// ============================================================================
// Block Reader
// ============================================================================

#[test]
fn test_read_bytes_partial_count_after_stall() {
    // Arrange: four bytes, then nothing
    let mock = create_mock_port_with_input("MOCK0", b"1234");
    let mut handle = SerialHandle::new(mock);
    let mut buf = [0u8; 10];

    // Act
    let started = Instant::now();
    let outcome = handle
        .read_bytes(&mut buf, Timeout::from_millis(50), Duration::from_millis(1))
        .unwrap();
    let elapsed = started.elapsed();

    // Assert: a partial result, not an error
    assert_eq!(outcome, BlockRead::TimedOut(4));
    assert_eq!(&buf[..4], b"1234");
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(50) + SLACK);
}

#[test]
fn test_read_bytes_completes_across_chunks() {
    // Arrange: data arrives two bytes per read
    let mock = create_mock_port_with_input("MOCK0", b"abcdefgh");
    mock.set_max_chunk(Some(2));
    let (mut handle, _clock) = stepped_handle(&mock);
    let mut buf = [0u8; 8];

    // Act
    let outcome = handle
        .read_bytes(&mut buf, Timeout::from_millis(100), Duration::ZERO)
        .unwrap();

    // Assert
    assert_eq!(outcome, BlockRead::Complete(8));
    assert_eq!(&buf, b"abcdefgh");
}

#[test]
fn test_write_then_block_read_round_trip() {
    // Arrange: TX wired to RX
    let mock = MockSerialPort::loopback("LOOP0");
    let mut handle = SerialHandle::new(mock);
    let payload: Vec<u8> = (0u8..=255).collect();

    // Act
    handle.write_bytes(&payload).unwrap();
    handle.write_byte(0x7f).unwrap();
    let mut echoed = vec![0u8; payload.len() + 1];
    let outcome = handle
        .read_bytes(&mut echoed, Timeout::from_millis(500), Duration::from_micros(100))
        .unwrap();

    // Assert: byte-for-byte equality
    assert_eq!(outcome, BlockRead::Complete(257));
    assert_eq!(&echoed[..256], payload.as_slice());
    assert_eq!(echoed[256], 0x7f);
}

// ============================================================================
// Configuration Mapper
// ============================================================================

#[test]
fn test_open_rejects_unsupported_speed() {
    // Act: settings are validated before the device is touched
    let err = SerialHandle::open("/dev/does-not-exist", &LineSettings::new(12345)).unwrap_err();

    // Assert
    assert_eq!(err.config_field(), Some(ConfigField::Speed));
    assert_eq!(err.legacy_code(), -4);
}

#[test]
fn test_open_rejects_sixteen_data_bits() {
    // Arrange
    let settings = LineSettings {
        data_bits: DataBits::Sixteen,
        ..LineSettings::default()
    };

    // Act
    let err = SerialHandle::open("/dev/does-not-exist", &settings).unwrap_err();

    // Assert
    assert_eq!(err.config_field(), Some(ConfigField::DataBits));
    assert_eq!(err.legacy_code(), -7);
}

#[cfg(unix)]
#[test]
fn test_open_missing_device_is_not_found() {
    let err = SerialHandle::open("/dev/does-not-exist", &LineSettings::default()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert_eq!(err.legacy_code(), -1);
}
