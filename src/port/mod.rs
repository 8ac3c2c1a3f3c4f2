//! Device layer for serial communication.
//!
//! Provides the [`SerialDevice`] trait the engine polls, the real
//! `serialport`-backed implementation, a scriptable mock, the line-settings
//! mapper and the modem-status bit set.

pub mod error;
pub mod mock;
pub mod modem;
pub mod settings;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use modem::ModemStatus;
pub use settings::{DataBits, LineDiscipline, LineSettings, Parity, StopBits, SUPPORTED_BAUD_RATES};
pub use sync_port::SyncSerialPort;
pub use traits::SerialDevice;
