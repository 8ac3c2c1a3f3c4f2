//! Tagged results of the read primitives.
//!
//! A timeout is a normal terminal outcome carrying whatever was read before
//! the deadline; hard failures travel separately as `Err(EngineError)`.

use crate::error::{EngineError, EngineResult};
use serde::Serialize;

/// Result of a single-byte read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "byte", rename_all = "snake_case")]
pub enum ByteRead {
    Byte(u8),
    TimedOut,
}

impl ByteRead {
    pub fn byte(self) -> Option<u8> {
        match self {
            Self::Byte(b) => Some(b),
            Self::TimedOut => None,
        }
    }
}

/// Result of a terminator-delimited read. Each variant carries the number of
/// bytes written into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "len", rename_all = "snake_case")]
pub enum StringRead {
    /// The terminator was read; the count includes it.
    Terminated(usize),
    /// The deadline passed first; the count is the partial data.
    TimedOut(usize),
    /// The buffer filled without a terminator.
    BufferFull(usize),
}

impl StringRead {
    pub fn len(self) -> usize {
        match self {
            Self::Terminated(n) | Self::TimedOut(n) | Self::BufferFull(n) => n,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Treat a full buffer as an error.
    ///
    /// Returns the line length for `Terminated`, `None` for `TimedOut` and
    /// [`EngineError::BufferFull`] otherwise.
    pub fn into_line(self) -> EngineResult<Option<usize>> {
        match self {
            Self::Terminated(n) => Ok(Some(n)),
            Self::TimedOut(_) => Ok(None),
            Self::BufferFull(n) => Err(EngineError::BufferFull(n)),
        }
    }
}

/// Result of a fixed-length block read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "count", rename_all = "snake_case")]
pub enum BlockRead {
    /// Every requested byte arrived.
    Complete(usize),
    /// The deadline passed with only this many bytes read.
    TimedOut(usize),
}

impl BlockRead {
    pub fn count(self) -> usize {
        match self {
            Self::Complete(n) | Self::TimedOut(n) => n,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// An owned line returned by [`SerialHandle::read_line`](super::SerialHandle::read_line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRead {
    pub bytes: Vec<u8>,
    pub outcome: StringRead,
}

impl LineRead {
    /// The line without its terminator, decoded lossily as UTF-8.
    pub fn text(&self) -> String {
        let end = if self.outcome.is_terminated() {
            self.bytes.len().saturating_sub(1)
        } else {
            self.bytes.len()
        };
        String::from_utf8_lossy(&self.bytes[..end]).into_owned()
    }
}
