//! serial-timed-io CLI
//!
//! Command-line front end for the timed serial I/O engine. Every command
//! opens the configured device, performs one operation and prints the result
//! as JSON on stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use thiserror::Error;

use serial_timed_io::config::{Config, ConfigError, ConfigLoader};
use serial_timed_io::{
    logging, DataBits, EngineError, Parity, SerialHandle, StopBits, SyncSerialPort, Timeout,
};

#[derive(Parser, Debug)]
#[command(name = "serial-timed-io")]
#[command(about = "Byte, line and block I/O on a serial device with millisecond timeouts")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial device path or alias (overrides config file)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Baud rate (overrides config file)
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Data bits: 5, 6, 7, 8
    #[arg(long, global = true)]
    data_bits: Option<DataBits>,

    /// Stop bits: 1 or 2
    #[arg(long, global = true)]
    stop_bits: Option<StopBits>,

    /// Parity: none, even, odd
    #[arg(long, global = true)]
    parity: Option<Parity>,

    /// Log level (overrides config file; RUST_LOG wins over both)
    #[arg(short, long, global = true, value_parser = parse_log_level)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a single byte
    ReadByte {
        /// Timeout in milliseconds; 0 waits forever
        #[arg(short, long)]
        timeout_ms: Option<u32>,
    },
    /// Read up to a terminator byte
    ReadLine {
        /// Timeout in milliseconds for the whole line; 0 waits forever
        #[arg(short, long)]
        timeout_ms: Option<u32>,
        /// Maximum number of bytes to read
        #[arg(short, long)]
        max_len: Option<usize>,
        /// Terminator as a number (10, 0x0a) or an escape (\n, \r)
        #[arg(long, value_parser = parse_byte)]
        terminator: Option<u8>,
    },
    /// Read a fixed number of bytes
    ReadBlock {
        /// Number of bytes to read
        count: usize,
        /// Timeout in milliseconds; 0 waits forever
        #[arg(short, long)]
        timeout_ms: Option<u32>,
        /// Sleep between empty polls, in microseconds
        #[arg(long)]
        poll_us: Option<u64>,
    },
    /// Write text or hex bytes
    Write {
        data: String,
        /// Interpret DATA as hex bytes ("02 41 0d" or "02410d")
        #[arg(long)]
        hex: bool,
    },
    /// Print the modem control and status lines
    Lines,
    /// Drive an output line
    SetLine {
        line: OutputLine,
        level: Level,
    },
    /// Discard unread input
    Flush,
    /// Print the number of unread input bytes
    Available,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputLine {
    Dtr,
    Rts,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Level {
    On,
    Off,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    fn code(&self) -> i32 {
        match self {
            Self::Engine(e) => e.legacy_code(),
            Self::Config(e) => e.legacy_code(),
            Self::Usage(_) => -1,
        }
    }

    /// Process exit status: 2 when the configuration is unusable, 1 otherwise.
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(2),
            Self::Engine(_) | Self::Usage(_) => ExitCode::FAILURE,
        }
    }

    fn to_json(&self) -> Value {
        json!({ "error": self.to_string(), "code": self.code() })
    }
}

fn parse_log_level(s: &str) -> Result<String, String> {
    s.parse::<tracing::Level>().map(|_| s.to_string()).map_err(|_| {
        format!(
            "Invalid log level: {}. Use: trace, debug, info, warn, error",
            s
        )
    })
}

fn parse_byte(s: &str) -> Result<u8, String> {
    match s {
        "\\n" => return Ok(b'\n'),
        "\\r" => return Ok(b'\r'),
        "\\0" => return Ok(0),
        "\\t" => return Ok(b'\t'),
        _ => {}
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid byte '{}'", s))
}

fn parse_hex(s: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if !digits.is_ascii() {
        return Err(CliError::Usage(format!("invalid hex data '{}'", s)));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::Usage(format!(
            "hex data has an odd number of digits: '{}'",
            s
        )));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CliError::Usage(format!("invalid hex byte '{}'", &digits[i..i + 2])))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    apply_overrides(cli, &mut config)?;
    Ok(config)
}

/// Layer command-line flags over the loaded configuration and validate it.
fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<(), CliError> {
    if let Some(device) = &cli.device {
        config.device.path = Some(device.clone());
    }
    if let Some(baud) = cli.baud {
        config.device.baud_rate = baud;
    }
    if let Some(data_bits) = cli.data_bits {
        config.device.data_bits = data_bits;
    }
    if let Some(stop_bits) = cli.stop_bits {
        config.device.stop_bits = stop_bits;
    }
    if let Some(parity) = cli.parity {
        config.device.parity = parity;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(())
}

fn open_device(config: &Config) -> Result<SerialHandle<SyncSerialPort>, CliError> {
    let name = config.device.path.as_deref().ok_or_else(|| {
        CliError::Usage("no device given; pass --device or set device.path".to_string())
    })?;
    let path = config.device.resolve_path(name);

    tracing::info!("Opening {} at {}", path, config.device.line_settings());
    let handle = SerialHandle::open(&path, &config.device.line_settings())?
        .with_idle_policy(config.io.idle_policy());
    Ok(handle)
}

fn timeout_or(config: &Config, timeout_ms: Option<u32>) -> Timeout {
    timeout_ms
        .map(Timeout::from_millis)
        .unwrap_or_else(|| config.io.timeout())
}

fn run(cli: &Cli, config: &Config) -> Result<Value, CliError> {
    let mut handle = open_device(config)?;
    let device = handle.name().to_string();

    let result = match &cli.command {
        Command::ReadByte { timeout_ms } => {
            let outcome = handle.read_byte(timeout_or(config, *timeout_ms))?;
            json!({ "result": outcome })
        }
        Command::ReadLine {
            timeout_ms,
            max_len,
            terminator,
        } => {
            let line = handle.read_line(
                terminator.unwrap_or(config.io.terminator),
                max_len.unwrap_or(config.io.max_line_len),
                timeout_or(config, *timeout_ms),
            )?;
            json!({
                "result": line.outcome,
                "text": line.text(),
                "hex": to_hex(&line.bytes),
            })
        }
        Command::ReadBlock {
            count,
            timeout_ms,
            poll_us,
        } => {
            let mut buf = vec![0u8; *count];
            let poll_interval = poll_us
                .map(std::time::Duration::from_micros)
                .unwrap_or_else(|| config.io.poll_interval());
            let outcome =
                handle.read_bytes(&mut buf, timeout_or(config, *timeout_ms), poll_interval)?;
            json!({
                "result": outcome,
                "hex": to_hex(&buf[..outcome.count()]),
            })
        }
        Command::Write { data, hex } => {
            let bytes = if *hex {
                parse_hex(data)?
            } else {
                data.as_bytes().to_vec()
            };
            handle.write_bytes(&bytes)?;
            json!({ "written": bytes.len() })
        }
        Command::Lines => {
            json!({
                "dtr": handle.dtr()?,
                "rts": handle.rts()?,
                "cts": handle.cts()?,
                "dsr": handle.dsr()?,
                "dcd": handle.dcd()?,
                "ri": handle.ri()?,
            })
        }
        Command::SetLine { line, level } => {
            let on = matches!(level, Level::On);
            match line {
                OutputLine::Dtr => handle.set_dtr(on)?,
                OutputLine::Rts => handle.set_rts(on)?,
            }
            json!({ "line": format!("{:?}", line).to_lowercase(), "level": on })
        }
        Command::Flush => {
            handle.flush_input()?;
            json!({ "flushed": true })
        }
        Command::Available => json!({ "available": handle.available()? }),
    };

    handle.close();
    Ok(json!({ "device": device, "data": result }))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return report(&e),
    };

    if let Err(e) = logging::init_tracing(&config.logging) {
        eprintln!("warning: logging disabled: {}", e);
    }

    tracing::debug!("Parsed command line arguments: {:?}", cli);

    match run(&cli, &config) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            report(&e)
        }
    }
}

fn report(e: &CliError) -> ExitCode {
    println!("{}", e.to_json());
    e.exit_code()
}
