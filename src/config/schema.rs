//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::engine::IdlePolicy;
use crate::port::{DataBits, LineSettings, Parity, StopBits};
use crate::timer::Timeout;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device and line settings
    pub device: DeviceConfig,
    /// Read loop tuning
    pub io: IoConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check the whole configuration for values the engine would reject.
    pub fn validate(&self) -> ConfigResult<()> {
        self.device.line_settings().map()?;

        if self.io.max_line_len == 0 {
            return Err(ConfigError::OutOfRange {
                key: "io.max_line_len",
                reason: "must be at least 1",
            });
        }
        if self.io.idle_policy == IdlePolicyKind::Sleep && self.io.idle_sleep_us == 0 {
            return Err(ConfigError::OutOfRange {
                key: "io.idle_sleep_us",
                reason: "must be non-zero when idle_policy = \"sleep\"",
            });
        }
        Ok(())
    }
}

/// Device configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device path, e.g. `/dev/ttyUSB0` (may be an alias)
    pub path: Option<String>,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    /// Short names for device paths
    pub aliases: HashMap<String, String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let line = LineSettings::default();
        Self {
            path: None,
            baud_rate: line.baud_rate,
            data_bits: line.data_bits,
            stop_bits: line.stop_bits,
            parity: line.parity,
            aliases: HashMap::new(),
        }
    }
}

impl DeviceConfig {
    pub fn line_settings(&self) -> LineSettings {
        LineSettings {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity,
        }
    }

    /// Resolve a device name through aliases
    pub fn resolve_path(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Which idle behaviour the byte/string readers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdlePolicyKind {
    #[default]
    Spin,
    Yield,
    Sleep,
}

impl FromStr for IdlePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spin" => Ok(Self::Spin),
            "yield" => Ok(Self::Yield),
            "sleep" => Ok(Self::Sleep),
            other => Err(format!("unknown idle policy '{other}'")),
        }
    }
}

/// Read loop configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Default read timeout in milliseconds (0 waits forever)
    pub timeout_ms: u32,
    /// Block reader sleep between empty polls, in microseconds
    pub poll_interval_us: u64,
    pub idle_policy: IdlePolicyKind,
    /// Sleep period for `idle_policy = "sleep"`, in microseconds
    pub idle_sleep_us: u64,
    /// Capacity for line reads
    pub max_line_len: usize,
    /// Line terminator byte
    pub terminator: u8,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            poll_interval_us: 1000,
            idle_policy: IdlePolicyKind::Spin,
            idle_sleep_us: 100,
            max_line_len: 256,
            terminator: b'\n',
        }
    }
}

impl IoConfig {
    pub fn timeout(&self) -> Timeout {
        Timeout::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    pub fn idle_policy(&self) -> IdlePolicy {
        match self.idle_policy {
            IdlePolicyKind::Spin => IdlePolicy::Spin,
            IdlePolicyKind::Yield => IdlePolicy::Yield,
            IdlePolicyKind::Sleep => IdlePolicy::Sleep(Duration::from_micros(self.idle_sleep_us)),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "pretty", "compact", "full"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line format with colors
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// Default single-line format with all fields
    Full,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Compact => f.write_str("compact"),
            Self::Full => f.write_str("full"),
        }
    }
}
