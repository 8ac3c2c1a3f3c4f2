//! What the byte and string readers do between empty polls.

use std::fmt;
use std::time::Duration;

/// Behaviour of the byte/string read loops when the device has no data.
///
/// The default is [`IdlePolicy::Spin`]: a tight loop with no yield, for the
/// lowest single-byte latency. The block reader always sleeps for its own
/// poll interval instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdlePolicy {
    #[default]
    Spin,
    Yield,
    Sleep(Duration),
}

impl IdlePolicy {
    /// Wait once according to the policy.
    pub fn idle(self) {
        match self {
            Self::Spin => std::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
            Self::Sleep(period) => std::thread::sleep(period),
        }
    }
}

impl fmt::Display for IdlePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spin => f.write_str("spin"),
            Self::Yield => f.write_str("yield"),
            Self::Sleep(period) => write!(f, "sleep({}us)", period.as_micros()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_spin() {
        assert_eq!(IdlePolicy::default(), IdlePolicy::Spin);
    }

    #[test]
    fn test_sleep_waits() {
        let start = std::time::Instant::now();
        IdlePolicy::Sleep(Duration::from_millis(2)).idle();
        assert!(start.elapsed() >= Duration::from_millis(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(IdlePolicy::Yield.to_string(), "yield");
        assert_eq!(
            IdlePolicy::Sleep(Duration::from_micros(250)).to_string(),
            "sleep(250us)"
        );
    }
}
