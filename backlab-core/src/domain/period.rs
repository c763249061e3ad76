use serde::{Deserialize, Serialize};
use std::fmt;

/// A look-back window length in bars: an integer in `1..=1000`.
///
/// Construction never fails for positive input; values above [`Period::MAX`]
/// clamp to it. Zero has no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Period(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("period must be at least 1")]
pub struct ZeroPeriod;

impl Period {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 1000;

    /// `None` for zero, otherwise the value clamped to `MAX`.
    pub const fn new(n: u32) -> Option<Self> {
        if n < Self::MIN {
            None
        } else if n > Self::MAX {
            Some(Self(Self::MAX))
        } else {
            Some(Self(n))
        }
    }

    /// Compile-time constructor for documented defaults.
    pub(crate) const fn lit(n: u32) -> Self {
        match Self::new(n) {
            Some(p) => p,
            None => panic!("period literal must be positive"),
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Period {
    type Error = ZeroPeriod;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(ZeroPeriod)
    }
}

impl From<Period> for u32 {
    fn from(p: Period) -> Self {
        p.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
