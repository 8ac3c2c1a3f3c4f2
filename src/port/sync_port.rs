//! Real serial device backed by the `serialport` crate.
//!
//! The port is opened with a zero read timeout so that reads return at once
//! when nothing is buffered; the engine's poll loops provide all waiting.

use super::error::PortError;
use super::modem::ModemStatus;
use super::settings::LineSettings;
use super::traits::SerialDevice;
use crate::error::{AttributeStage, EngineError, EngineResult};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

#[cfg(unix)]
type NativePort = serialport::TTYPort;
#[cfg(windows)]
type NativePort = serialport::COMPort;

/// Timeout used for the duration of a write so it blocks like a plain
/// `write(2)` on a blocking descriptor.
const BLOCKING_WRITE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Synchronous serial device wrapping the platform `serialport` type.
pub struct SyncSerialPort {
    port: NativePort,
    name: String,
    /// Last driven DTR/RTS levels where the platform cannot read them back.
    #[cfg(not(unix))]
    outputs: ModemStatus,
}

impl SyncSerialPort {
    /// Open `path` with the given line settings.
    ///
    /// The settings are validated before the device is touched, so an
    /// unsupported parameter is reported as [`EngineError::ConfigRejected`]
    /// even when the path does not exist.
    ///
    /// # Example
    /// ```no_run
    /// use serial_timed_io::port::{LineSettings, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &LineSettings::new(115200))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, settings: &LineSettings) -> EngineResult<Self> {
        let discipline = settings.map()?;

        #[cfg(unix)]
        {
            if !std::path::Path::new(path).exists() {
                return Err(EngineError::NotFound(path.to_string()));
            }
        }

        let mut port = discipline
            .builder(path)
            .open_native()
            .map_err(|e| classify_open_error(path, e))?;

        let actual_baud = port
            .baud_rate()
            .map_err(|e| EngineError::AttributeIoFailed {
                stage: AttributeStage::Read,
                source: PortError::Serial(e),
            })?;

        port.set_timeout(Duration::ZERO)
            .map_err(|e| EngineError::TimeoutSetFailed(PortError::Serial(e)))?;

        info!("Opened {} at {} (reported {} baud)", path, settings, actual_baud);

        Ok(Self {
            port,
            name: path.to_string(),
            #[cfg(not(unix))]
            outputs: ModemStatus::DTR | ModemStatus::RTS,
        })
    }

    /// Get a reference to the underlying serialport implementation.
    pub fn as_raw(&self) -> &NativePort {
        &self.port
    }

    /// Get a mutable reference to the underlying serialport implementation.
    pub fn as_raw_mut(&mut self) -> &mut NativePort {
        &mut self.port
    }
}

fn classify_open_error(path: &str, e: serialport::Error) -> EngineError {
    debug!("Open of {} failed: {}", path, e);
    match e.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            EngineError::NotFound(path.to_string())
        }
        serialport::ErrorKind::InvalidInput => EngineError::AttributeIoFailed {
            stage: AttributeStage::Write,
            source: PortError::Serial(e),
        },
        _ => EngineError::OpenFailed {
            path: path.to_string(),
            source: PortError::Serial(e),
        },
    }
}

impl SerialDevice for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_read(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.set_timeout(BLOCKING_WRITE_TIMEOUT)?;
        let written = self.port.write(data);
        self.port.set_timeout(Duration::ZERO)?;
        Ok(written?)
    }

    fn flush_input(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(PortError::Serial)
    }

    fn bytes_available(&self) -> Result<usize, PortError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(PortError::Serial)
    }

    #[cfg(unix)]
    fn modem_status(&mut self) -> Result<ModemStatus, PortError> {
        Ok(ModemStatus::from_tiocm(tiocm_get(&self.port)?))
    }

    #[cfg(unix)]
    fn set_modem_status(&mut self, status: ModemStatus) -> Result<(), PortError> {
        let current = tiocm_get(&self.port)?;
        tiocm_set(&self.port, status.merge_into_tiocm(current))
    }

    #[cfg(not(unix))]
    fn modem_status(&mut self) -> Result<ModemStatus, PortError> {
        let mut status = self.outputs;
        status.set(ModemStatus::CTS, self.port.read_clear_to_send()?);
        status.set(ModemStatus::DSR, self.port.read_data_set_ready()?);
        status.set(ModemStatus::DCD, self.port.read_carrier_detect()?);
        status.set(ModemStatus::RI, self.port.read_ring_indicator()?);
        Ok(status)
    }

    #[cfg(not(unix))]
    fn set_modem_status(&mut self, status: ModemStatus) -> Result<(), PortError> {
        self.port
            .write_data_terminal_ready(status.contains(ModemStatus::DTR))?;
        self.port
            .write_request_to_send(status.contains(ModemStatus::RTS))?;
        self.outputs = ModemStatus::empty();
        self.outputs.set(ModemStatus::DTR, status.contains(ModemStatus::DTR));
        self.outputs.set(ModemStatus::RTS, status.contains(ModemStatus::RTS));
        Ok(())
    }
}

#[cfg(unix)]
fn tiocm_get(port: &NativePort) -> Result<libc::c_int, PortError> {
    use std::os::unix::io::AsRawFd;

    let mut bits: libc::c_int = 0;
    // SAFETY: the descriptor is owned by `port` and stays open for the call;
    // TIOCMGET writes exactly one c_int through the pointer.
    let rc = unsafe {
        libc::ioctl(
            port.as_raw_fd(),
            libc::TIOCMGET,
            &mut bits as *mut libc::c_int,
        )
    };
    if rc == -1 {
        return Err(PortError::Io(io::Error::last_os_error()));
    }
    Ok(bits)
}

#[cfg(unix)]
fn tiocm_set(port: &NativePort, bits: libc::c_int) -> Result<(), PortError> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: as in `tiocm_get`; TIOCMSET only reads the c_int.
    let rc = unsafe {
        libc::ioctl(
            port.as_raw_fd(),
            libc::TIOCMSET,
            &bits as *const libc::c_int,
        )
    };
    if rc == -1 {
        return Err(PortError::Io(io::Error::last_os_error()));
    }
    Ok(())
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}
