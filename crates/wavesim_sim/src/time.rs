//! Integral simulation time and display units.
//!
//! [`SimTime`] counts abstract time units. Its meaning (ns, ps, cycles) is
//! chosen by the caller; [`TimeUnit`] only labels it for waveform output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in simulation time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    /// Time zero.
    pub const ZERO: SimTime = SimTime(0);

    /// Creates a time from a raw unit count.
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Returns the raw unit count.
    pub const fn units(self) -> u64 {
        self.0
    }

    /// Adds a delay, returning `None` on overflow.
    pub fn checked_add(self, delay: u64) -> Option<Self> {
        self.0.checked_add(delay).map(Self)
    }
}

impl From<u64> for SimTime {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

/// The physical unit one [`SimTime`] step stands for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Femtoseconds.
    Fs,
    /// Picoseconds.
    Ps,
    /// Nanoseconds.
    #[default]
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
}

impl TimeUnit {
    /// The VCD `$timescale` suffix for this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}
