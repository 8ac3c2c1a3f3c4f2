//! Modem control/status line bit set.

use std::fmt;
use std::ops::BitOr;

/// Snapshot of the modem lines of a serial device.
///
/// DTR and RTS are outputs driven by this end; CTS, DSR, DCD and RI are
/// inputs reported by the peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModemStatus(u8);

impl ModemStatus {
    /// Data Terminal Ready (output).
    pub const DTR: Self = Self(1 << 0);
    /// Request To Send (output).
    pub const RTS: Self = Self(1 << 1);
    /// Clear To Send (input).
    pub const CTS: Self = Self(1 << 2);
    /// Data Set Ready (input).
    pub const DSR: Self = Self(1 << 3);
    /// Data Carrier Detect (input).
    pub const DCD: Self = Self(1 << 4);
    /// Ring Indicator (input).
    pub const RI: Self = Self(1 << 5);

    /// The lines this end can drive.
    pub const OUTPUTS: Self = Self(Self::DTR.0 | Self::RTS.0);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Insert or remove `other` depending on `level`.
    pub fn set(&mut self, other: Self, level: bool) {
        if level {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Convert from the kernel's `TIOCM_*` bits.
    #[cfg(unix)]
    pub fn from_tiocm(bits: libc::c_int) -> Self {
        let mut status = Self::empty();
        status.set(Self::DTR, bits & libc::TIOCM_DTR != 0);
        status.set(Self::RTS, bits & libc::TIOCM_RTS != 0);
        status.set(Self::CTS, bits & libc::TIOCM_CTS != 0);
        status.set(Self::DSR, bits & libc::TIOCM_DSR != 0);
        status.set(Self::DCD, bits & libc::TIOCM_CAR != 0);
        status.set(Self::RI, bits & libc::TIOCM_RNG != 0);
        status
    }

    /// Apply the output lines of `self` onto kernel `TIOCM_*` bits,
    /// leaving every other bit of `bits` untouched.
    #[cfg(unix)]
    pub fn merge_into_tiocm(self, bits: libc::c_int) -> libc::c_int {
        let mut merged = bits & !(libc::TIOCM_DTR | libc::TIOCM_RTS);
        if self.contains(Self::DTR) {
            merged |= libc::TIOCM_DTR;
        }
        if self.contains(Self::RTS) {
            merged |= libc::TIOCM_RTS;
        }
        merged
    }
}

impl BitOr for ModemStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ModemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModemStatus")
            .field("dtr", &self.contains(Self::DTR))
            .field("rts", &self.contains(Self::RTS))
            .field("cts", &self.contains(Self::CTS))
            .field("dsr", &self.contains(Self::DSR))
            .field("dcd", &self.contains(Self::DCD))
            .field("ri", &self.contains(Self::RI))
            .finish()
    }
}
