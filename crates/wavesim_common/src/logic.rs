//! Two-state logic values with Boolean operators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A single two-state logic level.
///
/// Ordered `Zero < One`, so sorting events by `(time, signal, value)`
/// places a falling value ahead of a rising one at the same instant.
/// Serialized as the integer `0` or `1`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    #[default]
    Zero = 0,
    /// Logic high (1).
    One = 1,
}

/// Error returned when an integer other than 0 or 1 is used as a [`Logic`] level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid logic value {0}: expected 0 or 1")]
pub struct InvalidLogicValue(pub u8);

impl Logic {
    /// Returns `true` for [`Logic::One`].
    pub fn is_high(self) -> bool {
        self == Logic::One
    }
}

impl From<bool> for Logic {
    fn from(b: bool) -> Self {
        if b {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl From<Logic> for bool {
    fn from(v: Logic) -> Self {
        v.is_high()
    }
}

impl From<Logic> for u8 {
    fn from(v: Logic) -> Self {
        v as u8
    }
}

impl TryFrom<u8> for Logic {
    type Error = InvalidLogicValue;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Logic::Zero),
            1 => Ok(Logic::One),
            other => Err(InvalidLogicValue(other)),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
        }
    }
}

impl BitAnd for Logic {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Logic::from(self.is_high() && rhs.is_high())
    }
}

impl BitOr for Logic {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Logic::from(self.is_high() || rhs.is_high())
    }
}

impl BitXor for Logic {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Logic::from(self != rhs)
    }
}

impl Not for Logic {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Logic::Zero => Logic::One,
            Logic::One => Logic::Zero,
        }
    }
}
