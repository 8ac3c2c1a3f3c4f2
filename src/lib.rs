//! Serial Timed I/O Library
//!
//! A low-level serial-port engine: open and configure a character device,
//! then read single bytes, terminator-delimited strings or fixed-length
//! blocks with millisecond timeouts, write bytes, and drive or sample the
//! modem control lines.
//!
//! A timeout of `0` ([`Timeout::INFINITE`]) waits indefinitely.
//!
//! # Modules
//!
//! - `engine`: the timed read/write loops on an explicit [`SerialHandle`]
//! - `timer`: clocks, elapsed-time measurement and [`Timeout`]
//! - `port`: the [`SerialDevice`] abstraction, real and mock devices, line settings
//! - `error`: engine error taxonomy
//! - `legacy`: process-wide single-device wrapper around the engine
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod logging;
pub mod port;
pub mod timer;

// Re-export commonly used types for convenience
pub use engine::{BlockRead, ByteRead, IdlePolicy, LineRead, SerialHandle, StringRead};
pub use error::{AttributeStage, ConfigField, EngineError, EngineResult};
pub use port::{
    DataBits, LineSettings, MockSerialPort, ModemStatus, Parity, PortError, SerialDevice,
    StopBits, SyncSerialPort,
};
pub use timer::{Clock, ElapsedTimer, MonotonicClock, Timeout, Timestamp, WallClock};
