//! Elapsed-time measurement for the polling read loops.
//!
//! A [`Clock`] produces [`Timestamp`]s split into whole seconds and
//! microseconds. [`ElapsedTimer`] snapshots one timestamp at the start of a
//! read and reports the milliseconds since then on every poll iteration.
//! [`Timeout`] is the millisecond budget handed to each read.

use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const MICROS_PER_SEC: u32 = 1_000_000;

/// A clock sample: whole seconds plus the sub-second part in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    secs: u64,
    micros: u32,
}

impl Timestamp {
    /// Build a timestamp, carrying any whole seconds out of `micros`.
    pub fn new(secs: u64, micros: u32) -> Self {
        Self {
            secs: secs + u64::from(micros / MICROS_PER_SEC),
            micros: micros % MICROS_PER_SEC,
        }
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self::new(duration.as_secs(), duration.subsec_micros())
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn micros(&self) -> u32 {
        self.micros
    }

    /// Whole milliseconds from `earlier` to `self`.
    ///
    /// When the later sample's microsecond part is smaller than the earlier
    /// one, a second is borrowed. A later sample that precedes `earlier`
    /// (a wall clock stepped backwards) yields 0, never a negative span.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        if *self <= earlier {
            return 0;
        }

        let mut secs = self.secs - earlier.secs;
        let micros = if self.micros >= earlier.micros {
            self.micros - earlier.micros
        } else {
            // self > earlier with a smaller fraction implies secs >= 1
            secs -= 1;
            MICROS_PER_SEC - earlier.micros + self.micros
        };

        secs * 1000 + u64::from(micros / 1000)
    }
}

/// Source of [`Timestamp`]s for the read loops.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Sample the current time.
    fn now(&self) -> EngineResult<Timestamp>;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> EngineResult<Timestamp> {
        (**self).now()
    }
}

static PROCESS_ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);

/// Monotonic clock measured from a process-wide anchor. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> EngineResult<Timestamp> {
        Ok(Timestamp::from_duration(PROCESS_ANCHOR.elapsed()))
    }
}

/// Wall clock (seconds since the Unix epoch).
///
/// Fails with [`EngineError::Clock`] if the system time is before the epoch.
/// May step backwards; [`ElapsedTimer`] absorbs that.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> EngineResult<Timestamp> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(Timestamp::from_duration)
            .map_err(|e| EngineError::Clock(e.to_string()))
    }
}

/// Start-of-operation snapshot that reports elapsed milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedTimer {
    started: Timestamp,
    last_reported: u64,
}

impl ElapsedTimer {
    /// Capture the current time from `clock`.
    pub fn start<C: Clock + ?Sized>(clock: &C) -> EngineResult<Self> {
        Ok(Self {
            started: clock.now()?,
            last_reported: 0,
        })
    }

    /// Re-capture the start instant.
    pub fn restart<C: Clock + ?Sized>(&mut self, clock: &C) -> EngineResult<()> {
        *self = Self::start(clock)?;
        Ok(())
    }

    pub fn started_at(&self) -> Timestamp {
        self.started
    }

    /// Milliseconds since [`ElapsedTimer::start`]; never less than the
    /// previous report from this timer.
    pub fn elapsed_millis<C: Clock + ?Sized>(&mut self, clock: &C) -> EngineResult<u64> {
        let now = clock.now()?;
        self.last_reported = self.last_reported.max(now.millis_since(self.started));
        Ok(self.last_reported)
    }
}

/// A read timeout in milliseconds.
///
/// **`0` is the reserved "wait indefinitely" value** ([`Timeout::INFINITE`]),
/// not "return immediately". A finite timeout always has at least 1 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeout(u32);

impl Timeout {
    /// No deadline: reads block until they complete or fail.
    pub const INFINITE: Timeout = Timeout(0);

    /// A timeout of `millis` milliseconds. `0` yields [`Timeout::INFINITE`].
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    pub const fn is_infinite(self) -> bool {
        self.0 == 0
    }

    /// Whether `elapsed_ms` has reached the deadline. Never true for
    /// [`Timeout::INFINITE`].
    pub fn expired(self, elapsed_ms: u64) -> bool {
        !self.is_infinite() && elapsed_ms >= u64::from(self.0)
    }

    /// Budget left after `elapsed_ms`, or `None` once the deadline is reached.
    ///
    /// An infinite timeout stays infinite. A finite remainder is at least
    /// 1 ms, so it can never collapse into the infinite sentinel.
    pub fn remaining(self, elapsed_ms: u64) -> Option<Timeout> {
        if self.is_infinite() {
            return Some(self);
        }
        let total = u64::from(self.0);
        if elapsed_ms >= total {
            return None;
        }
        // total - elapsed_ms is in 1..=u32::MAX here
        Some(Timeout((total - elapsed_ms) as u32))
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::INFINITE
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            f.write_str("infinite")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
