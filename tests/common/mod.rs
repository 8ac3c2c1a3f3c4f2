//! Shared test utilities for the timed I/O tests.
//!
//! This module provides common test infrastructure including:
//! - A deterministic clock that advances on every sample
//! - Mock device builders with pre-programmed input
//! - Handle constructors wiring the two together

#![allow(dead_code)]

use serial_timed_io::port::MockSerialPort;
use serial_timed_io::{Clock, EngineResult, SerialHandle, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Clock that moves forward by a fixed step each time it is sampled.
///
/// Read loops sample the clock once per poll, so a step of 1 ms turns
/// "milliseconds elapsed" into "number of polls" and makes timeouts exact.
#[derive(Debug)]
pub struct StepClock {
    now_us: AtomicU64,
    step_us: u64,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now_us: AtomicU64::new(0),
            step_us: step.as_micros() as u64,
        }
    }

    /// Step of one millisecond per sample.
    pub fn per_poll_ms() -> Self {
        Self::new(Duration::from_millis(1))
    }

    /// Total simulated time so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.now_us.load(Ordering::SeqCst))
    }
}

impl Clock for StepClock {
    fn now(&self) -> EngineResult<Timestamp> {
        let t = self.now_us.fetch_add(self.step_us, Ordering::SeqCst);
        Ok(Timestamp::from_duration(Duration::from_micros(t)))
    }
}

/// Create a mock device with pre-programmed input.
///
/// # Example
/// ```ignore
/// let mock = create_mock_port_with_input("MOCK0", b"OK\r\n");
/// ```
pub fn create_mock_port_with_input(port_name: &str, input: &[u8]) -> MockSerialPort {
    let mock = MockSerialPort::new(port_name);
    mock.enqueue_read(input);
    mock
}

/// A handle over `mock` driven by a shared [`StepClock`].
pub fn stepped_handle(
    mock: &MockSerialPort,
) -> (SerialHandle<MockSerialPort, Arc<StepClock>>, Arc<StepClock>) {
    let clock = Arc::new(StepClock::per_poll_ms());
    let handle = SerialHandle::new(mock.clone()).with_clock(Arc::clone(&clock));
    (handle, clock)
}

/// Feed `data` into `mock` from another thread after `delay`.
pub fn deliver_later(
    mock: &MockSerialPort,
    delay: Duration,
    data: &'static [u8],
) -> std::thread::JoinHandle<()> {
    let mock = mock.clone();
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        mock.enqueue_read(data);
    })
}
