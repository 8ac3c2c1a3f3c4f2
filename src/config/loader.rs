//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_TIMED_IO";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-timed-io.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_TIMED_IO_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_TIMED_IO_CONFIG` environment variable (explicit path)
    /// 2. `./serial-timed-io.toml` (current directory)
    /// 3. The platform config directory (`~/.config/serial-timed-io/` on
    ///    Linux, `%APPDATA%\serial-timed-io\config\` on Windows)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            debug!("Loading configuration from {}", path.display());
            load_from_file(path)?
        } else {
            debug!("No configuration file found, using defaults");
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to the file it was loaded from.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoPath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-timed-io").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse `<PREFIX>_<key>` into `target` if it is set.
fn override_from_env<T>(key: &str, target: &mut T) -> ConfigResult<()>
where
    T: FromStr,
    T::Err: Display,
{
    let var = format!("{}_{}", ENV_PREFIX, key);
    if let Ok(val) = std::env::var(&var) {
        *target = match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => return Err(ConfigError::env(var, val, e)),
        };
    }
    Ok(())
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_TIMED_IO_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_TIMED_IO_DEVICE_PATH=/dev/ttyUSB1`
/// - `SERIAL_TIMED_IO_DEVICE_BAUD_RATE=115200`
/// - `SERIAL_TIMED_IO_IO_TIMEOUT_MS=250`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Device overrides
    if let Ok(val) = std::env::var(format!("{}_DEVICE_PATH", ENV_PREFIX)) {
        config.device.path = Some(val);
    }
    override_from_env("DEVICE_BAUD_RATE", &mut config.device.baud_rate)?;
    override_from_env("DEVICE_DATA_BITS", &mut config.device.data_bits)?;
    override_from_env("DEVICE_STOP_BITS", &mut config.device.stop_bits)?;
    override_from_env("DEVICE_PARITY", &mut config.device.parity)?;

    // IO overrides
    override_from_env("IO_TIMEOUT_MS", &mut config.io.timeout_ms)?;
    override_from_env("IO_POLL_INTERVAL_US", &mut config.io.poll_interval_us)?;
    override_from_env("IO_IDLE_POLICY", &mut config.io.idle_policy)?;
    override_from_env("IO_IDLE_SLEEP_US", &mut config.io.idle_sleep_us)?;
    override_from_env("IO_MAX_LINE_LEN", &mut config.io.max_line_len)?;
    override_from_env("IO_TERMINATOR", &mut config.io.terminator)?;

    // Logging overrides
    override_from_env("LOGGING_LEVEL", &mut config.logging.level)?;
    override_from_env("LOGGING_FORMAT", &mut config.logging.format)?;

    Ok(())
}
