//! Timed reads and writes on a real `SyncSerialPort` backed by a pseudo-terminal.
//!
//! The pty slave stands in for the serial device and is opened through the
//! normal `SerialHandle::open` path. The test keeps the master side and plays
//! the far end of the line. No hardware is needed.

#![cfg(target_os = "linux")]

use serial_timed_io::port::LineSettings;
use serial_timed_io::{
    BlockRead, ByteRead, EngineError, SerialHandle, StringRead, SyncSerialPort, Timeout,
};
use std::ffi::CStr;
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

struct Pty {
    /// Far end of the line
    master: File,
    slave_path: String,
    /// Held so the slave stays configured until the port is opened
    _slave: OwnedFd,
}

fn open_pty() -> Pty {
    let mut master: libc::c_int = -1;
    let mut slave: libc::c_int = -1;
    let mut name = [0 as libc::c_char; 128];

    // SAFETY: both fd pointers and the name buffer are valid for the call;
    // 128 bytes is well above the kernel's pts path length.
    let rc = unsafe {
        libc::openpty(
            &mut master,
            &mut slave,
            name.as_mut_ptr(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    assert_eq!(rc, 0, "openpty failed: {}", std::io::Error::last_os_error());

    // SAFETY: openpty succeeded, so both descriptors are open and owned here
    // and `name` holds a NUL-terminated path.
    unsafe {
        Pty {
            master: File::from_raw_fd(master),
            slave_path: CStr::from_ptr(name.as_ptr()).to_string_lossy().into_owned(),
            _slave: OwnedFd::from_raw_fd(slave),
        }
    }
}

fn open_handle(pty: &Pty) -> SerialHandle<SyncSerialPort> {
    SerialHandle::open(&pty.slave_path, &LineSettings::new(9600))
        .unwrap_or_else(|e| panic!("open {} failed: {}", pty.slave_path, e))
}

/// Read up to `len` bytes from the master side, giving up after two seconds.
fn read_far_end(master: &mut File, len: usize) -> Vec<u8> {
    let mut received = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(2);
    while received.len() < len && Instant::now() < deadline {
        let mut pfd = libc::pollfd {
            fd: master.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut pfd, 1, 100) };
        if ready > 0 {
            let mut chunk = [0u8; 64];
            let n = master.read(&mut chunk).unwrap();
            received.extend_from_slice(&chunk[..n]);
        }
    }
    received
}

#[test]
fn test_idle_pty_read_times_out() {
    // Arrange
    let pty = open_pty();
    let mut handle = open_handle(&pty);

    // Act
    let started = Instant::now();
    let outcome = handle.read_byte(Timeout::from_millis(50)).unwrap();
    let elapsed = started.elapsed();

    // Assert
    assert_eq!(outcome, ByteRead::TimedOut);
    assert!(elapsed >= Duration::from_millis(50), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "returned after {:?}", elapsed);
}

#[test]
fn test_line_from_far_end_is_terminated() {
    // Arrange
    let mut pty = open_pty();
    let mut handle = open_handle(&pty);
    pty.master.write_all(b"OK\n").unwrap();

    // Act
    let mut buf = [0u8; 10];
    let outcome = handle
        .read_string(b'\n', &mut buf, Timeout::from_millis(1000))
        .unwrap();

    // Assert
    assert_eq!(outcome, StringRead::Terminated(3));
    assert_eq!(&buf[..3], b"OK\n");
}

#[test]
fn test_short_block_times_out_with_partial_data() {
    // Arrange
    let mut pty = open_pty();
    let mut handle = open_handle(&pty);
    pty.master.write_all(b"1234").unwrap();

    // Act
    let mut buf = [0u8; 10];
    let outcome = handle
        .read_bytes(&mut buf, Timeout::from_millis(50), Duration::from_millis(1))
        .unwrap();

    // Assert
    assert_eq!(outcome, BlockRead::TimedOut(4));
    assert_eq!(&buf[..4], b"1234");
}

#[test]
fn test_write_reaches_far_end_and_reads_stay_non_blocking() {
    // Arrange
    let mut pty = open_pty();
    let mut handle = open_handle(&pty);

    // Act
    handle.write_str("PING").unwrap();
    let echoed = read_far_end(&mut pty.master, 4);
    let started = Instant::now();
    let after_write = handle.read_byte(Timeout::from_millis(20)).unwrap();

    // Assert
    assert_eq!(echoed, b"PING");
    // The write timeout must not leak into later reads
    assert_eq!(after_write, ByteRead::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_hangup_fails_infinite_read() {
    // Arrange
    let pty = open_pty();
    let mut handle = open_handle(&pty);
    let Pty { master, _slave, .. } = pty;
    let (tx, rx) = mpsc::channel();

    // Act
    drop(master);
    thread::spawn(move || {
        let _ = tx.send(handle.read_byte(Timeout::INFINITE));
        drop(_slave);
    });
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("read_byte(INFINITE) kept waiting after the far end hung up");

    // Assert
    assert!(matches!(result, Err(EngineError::ReadFailed(_))), "got {:?}", result);
}
