//! Small closed vocabularies used across conditions.
//!
//! Wire spellings follow the execution engine: the indicator column is `v`,
//! the USD price column is `usd`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which column of a dataset a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Series {
    #[default]
    #[serde(rename = "v")]
    Indicator,
    #[serde(rename = "usd")]
    Price,
}

impl Series {
    pub fn code(self) -> &'static str {
        match self {
            Series::Indicator => "v",
            Series::Price => "usd",
        }
    }
}

/// Moving-average flavour used by crossovers and the price filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    #[default]
    Sma,
    Ema,
}

/// Crossing direction. `Up`: A goes from `<=` B to strictly `>` B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Side of the moving average the price must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[default]
    Above,
    Below,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}
