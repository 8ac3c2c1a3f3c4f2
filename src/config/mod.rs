//! Configuration module for serial-timed-io.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_TIMED_IO_CONFIG` environment variable (explicit path)
//! 2. `./serial-timed-io.toml` (current directory)
//! 3. `serial-timed-io.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `SERIAL_TIMED_IO_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_TIMED_IO_DEVICE_PATH=/dev/ttyUSB0`
//! - `SERIAL_TIMED_IO_DEVICE_BAUD_RATE=115200`
//! - `SERIAL_TIMED_IO_IO_IDLE_POLICY=yield`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_timed_io::config::ConfigLoader;
//!
//! // Load configuration with automatic resolution
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! config.validate()?;
//!
//! println!("Line: {}", config.device.line_settings());
//! println!("Timeout: {}", config.io.timeout());
//! # Ok::<(), serial_timed_io::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, DeviceConfig, IdlePolicyKind, IoConfig, LogFormat, LoggingConfig};
