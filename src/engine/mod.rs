//! Timed I/O engine.
//!
//! [`SerialHandle`] owns one open [`SerialDevice`] and the [`Clock`] its read
//! loops sample. The readers live in `reader`, the writers in `writer`;
//! this module holds construction and the control-line accessors.
//!
//! ```no_run
//! use serial_timed_io::{LineSettings, SerialHandle, Timeout};
//!
//! let mut handle = SerialHandle::open("/dev/ttyUSB0", &LineSettings::new(115200))?;
//! handle.write_str("AT\r")?;
//! let line = handle.read_line(b'\n', 64, Timeout::from_millis(500))?;
//! println!("{}", line.text());
//! # Ok::<(), serial_timed_io::EngineError>(())
//! ```

mod idle;
mod outcome;
mod reader;
mod writer;

pub use idle::IdlePolicy;
pub use outcome::{BlockRead, ByteRead, LineRead, StringRead};

use crate::error::{EngineError, EngineResult};
use crate::port::{LineSettings, ModemStatus, PortError, SerialDevice, SyncSerialPort};
use crate::timer::{Clock, MonotonicClock};
use tracing::{debug, info, warn};

/// An open serial device plus the clock used to time its reads.
///
/// Every operation takes `&mut self`: a handle serves one caller at a time.
/// Share it across threads behind a mutex.
#[derive(Debug)]
pub struct SerialHandle<D, C = MonotonicClock> {
    device: D,
    clock: C,
    idle: IdlePolicy,
}

impl SerialHandle<SyncSerialPort> {
    /// Open and configure a real serial device.
    pub fn open(path: &str, settings: &LineSettings) -> EngineResult<Self> {
        SyncSerialPort::open(path, settings).map(Self::new)
    }
}

impl<D: SerialDevice> SerialHandle<D> {
    /// Wrap an already-open device, timing reads with [`MonotonicClock`].
    pub fn new(device: D) -> Self {
        Self {
            device,
            clock: MonotonicClock,
            idle: IdlePolicy::default(),
        }
    }
}

impl<D: SerialDevice, C: Clock> SerialHandle<D, C> {
    /// Replace the clock the read loops sample.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SerialHandle<D, C2> {
        SerialHandle {
            device: self.device,
            clock,
            idle: self.idle,
        }
    }

    pub fn with_idle_policy(mut self, idle: IdlePolicy) -> Self {
        self.idle = idle;
        self
    }

    pub fn set_idle_policy(&mut self, idle: IdlePolicy) {
        self.idle = idle;
    }

    pub fn idle_policy(&self) -> IdlePolicy {
        self.idle
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn name(&self) -> &str {
        self.device.name()
    }

    /// A live handle is always open; closing consumes it.
    pub fn is_open(&self) -> bool {
        true
    }

    /// Close the device, returning it to the caller.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Close the device.
    pub fn close(self) {
        info!("Closing serial device {}", self.device.name());
        drop(self.device);
    }

    /// Discard unread input buffered by the OS.
    pub fn flush_input(&mut self) -> EngineResult<()> {
        debug!("Flushing input of {}", self.device.name());
        self.device.flush_input().map_err(line_control_failed)
    }

    /// Number of received bytes not yet consumed.
    pub fn available(&self) -> EngineResult<usize> {
        self.device.bytes_available().map_err(line_control_failed)
    }

    /// Snapshot of every modem line.
    pub fn modem_status(&mut self) -> EngineResult<ModemStatus> {
        self.device.modem_status().map_err(line_control_failed)
    }

    fn set_output(&mut self, line: ModemStatus, level: bool) -> EngineResult<()> {
        let mut status = self.modem_status()?;
        status.set(line, level);
        debug!("Setting {:?} = {} on {}", line, level, self.device.name());
        self.device
            .set_modem_status(status)
            .map_err(line_control_failed)
    }

    fn line(&mut self, line: ModemStatus) -> EngineResult<bool> {
        Ok(self.modem_status()?.contains(line))
    }

    /// Raise (`true`) or drop (`false`) Data Terminal Ready.
    pub fn set_dtr(&mut self, level: bool) -> EngineResult<()> {
        self.set_output(ModemStatus::DTR, level)
    }

    /// Raise (`true`) or drop (`false`) Request To Send.
    pub fn set_rts(&mut self, level: bool) -> EngineResult<()> {
        self.set_output(ModemStatus::RTS, level)
    }

    pub fn dtr(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::DTR)
    }

    pub fn rts(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::RTS)
    }

    /// Clear To Send, as reported by the peer.
    pub fn cts(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::CTS)
    }

    /// Data Set Ready, as reported by the peer.
    pub fn dsr(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::DSR)
    }

    /// Data Carrier Detect.
    pub fn dcd(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::DCD)
    }

    /// Ring Indicator.
    pub fn ri(&mut self) -> EngineResult<bool> {
        self.line(ModemStatus::RI)
    }
}

fn line_control_failed(e: PortError) -> EngineError {
    warn!("Line control failed: {}", e);
    EngineError::LineControlFailed(e)
}
