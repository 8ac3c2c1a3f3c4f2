//! Line-settings mapper.
//!
//! Callers describe the line they want with [`LineSettings`], whose enums
//! cover every value the wire format can express. [`LineSettings::map`]
//! checks each field against what the OS layer supports and produces a
//! [`LineDiscipline`] of `serialport` types, or a rejection naming the
//! offending field.

use crate::error::{ConfigField, EngineError, EngineResult};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Baud rates the mapper accepts.
pub const SUPPORTED_BAUD_RATES: &[u32] = &[
    110, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 500000,
    576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000, 3000000, 3500000, 4000000,
];

/// A line setting as written in a config file: `8`, `1.5` or `"eight"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SettingValue {
    Integer(u64),
    Float(f64),
    Name(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

fn deserialize_setting<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    SettingValue::deserialize(deserializer)?
        .to_string()
        .parse()
        .map_err(de::Error::custom)
}

/// Number of data bits per character.
///
/// Serialized as the bit count; names such as `"eight"` are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
    /// Not supported by termios.
    Sixteen,
}

impl DataBits {
    pub fn count(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}

impl TryFrom<DataBits> for serialport::DataBits {
    type Error = EngineError;

    fn try_from(bits: DataBits) -> EngineResult<Self> {
        match bits {
            DataBits::Five => Ok(serialport::DataBits::Five),
            DataBits::Six => Ok(serialport::DataBits::Six),
            DataBits::Seven => Ok(serialport::DataBits::Seven),
            DataBits::Eight => Ok(serialport::DataBits::Eight),
            DataBits::Sixteen => Err(EngineError::rejected(ConfigField::DataBits, bits)),
        }
    }
}

impl Serialize for DataBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.count())
    }
}

impl<'de> Deserialize<'de> for DataBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_setting(deserializer)
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

impl FromStr for DataBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "5" | "five" => Ok(Self::Five),
            "6" | "six" => Ok(Self::Six),
            "7" | "seven" => Ok(Self::Seven),
            "8" | "eight" => Ok(Self::Eight),
            "16" | "sixteen" => Ok(Self::Sixteen),
            other => Err(format!("invalid data bits '{other}' (expected 5, 6, 7, 8 or 16)")),
        }
    }
}

/// Number of stop bits: `1`, `1.5` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopBits {
    One,
    /// Not supported by termios.
    OnePointFive,
    Two,
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = EngineError;

    fn try_from(bits: StopBits) -> EngineResult<Self> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::Two => Ok(serialport::StopBits::Two),
            StopBits::OnePointFive => Err(EngineError::rejected(ConfigField::StopBits, bits)),
        }
    }
}

impl Serialize for StopBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::One => serializer.serialize_u8(1),
            Self::OnePointFive => serializer.serialize_f64(1.5),
            Self::Two => serializer.serialize_u8(2),
        }
    }
}

impl<'de> Deserialize<'de> for StopBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_setting(deserializer)
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::OnePointFive => f.write_str("1.5"),
            Self::Two => f.write_str("2"),
        }
    }
}

impl FromStr for StopBits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "one" => Ok(Self::One),
            "1.5" | "one_point_five" => Ok(Self::OnePointFive),
            "2" | "two" => Ok(Self::Two),
            other => Err(format!("invalid stop bits '{other}' (expected 1, 1.5 or 2)")),
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
    /// Not supported by termios.
    Mark,
    /// Not supported by termios.
    Space,
}

impl TryFrom<Parity> for serialport::Parity {
    type Error = EngineError;

    fn try_from(parity: Parity) -> EngineResult<Self> {
        match parity {
            Parity::None => Ok(serialport::Parity::None),
            Parity::Even => Ok(serialport::Parity::Even),
            Parity::Odd => Ok(serialport::Parity::Odd),
            Parity::Mark | Parity::Space => {
                Err(EngineError::rejected(ConfigField::Parity, parity))
            }
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Mark => "mark",
            Self::Space => "space",
        };
        f.write_str(name)
    }
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n" | "none" => Ok(Self::None),
            "e" | "even" => Ok(Self::Even),
            "o" | "odd" => Ok(Self::Odd),
            "m" | "mark" => Ok(Self::Mark),
            "s" | "space" => Ok(Self::Space),
            other => Err(format!(
                "invalid parity '{other}' (expected none, even, odd, mark or space)"
            )),
        }
    }
}

/// Requested line parameters for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// Baud rate (bits per second).
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

impl LineSettings {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }

    /// Validate every field and translate it into OS line settings.
    ///
    /// Fields are checked in the order speed, data bits, stop bits, parity;
    /// the first unsupported one is reported.
    pub fn map(&self) -> EngineResult<LineDiscipline> {
        if !SUPPORTED_BAUD_RATES.contains(&self.baud_rate) {
            return Err(EngineError::rejected(ConfigField::Speed, self.baud_rate));
        }

        Ok(LineDiscipline {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits.try_into()?,
            stop_bits: self.stop_bits.try_into()?,
            parity: self.parity.try_into()?,
        })
    }
}

impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        };
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}

/// Validated line settings expressed in `serialport` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDiscipline {
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub stop_bits: serialport::StopBits,
    pub parity: serialport::Parity,
}

impl LineDiscipline {
    /// A port builder for `path` with these settings, no flow control and a
    /// zero read timeout (reads return immediately when idle).
    pub fn builder(&self, path: &str) -> serialport::SerialPortBuilder {
        serialport::new(path, self.baud_rate)
            .data_bits(self.data_bits)
            .stop_bits(self.stop_bits)
            .parity(self.parity)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::ZERO)
    }
}
