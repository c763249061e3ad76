//! Fast/slow moving-average crossover on a single dataset.

use crate::domain::{Direction, MaKind, Period};

/// One side (entry or exit) of a single-dataset crossover.
///
/// `fast` and `slow` are independent; nothing forces `fast < slow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverLeg {
    pub fast_period: Period,
    pub slow_period: Period,
    pub ma_kind: MaKind,
    pub direction: Direction,
}

impl CrossoverLeg {
    pub const DEFAULT_ENTRY: CrossoverLeg = CrossoverLeg {
        fast_period: Period::lit(7),
        slow_period: Period::lit(30),
        ma_kind: MaKind::Sma,
        direction: Direction::Up,
    };

    pub const DEFAULT_EXIT: CrossoverLeg = CrossoverLeg {
        fast_period: Period::lit(7),
        slow_period: Period::lit(14),
        ma_kind: MaKind::Sma,
        direction: Direction::Down,
    };

    pub fn apply(&mut self, edit: CrossoverLegEdit) {
        match edit {
            CrossoverLegEdit::FastPeriod(p) => self.fast_period = p,
            CrossoverLegEdit::SlowPeriod(p) => self.slow_period = p,
            CrossoverLegEdit::MaKind(kind) => self.ma_kind = kind,
            CrossoverLegEdit::Direction(direction) => self.direction = direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverLegEdit {
    FastPeriod(Period),
    SlowPeriod(Period),
    MaKind(MaKind),
    Direction(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleCrossoverCondition {
    pub entry: CrossoverLeg,
    pub exit: CrossoverLeg,
}

impl Default for SingleCrossoverCondition {
    fn default() -> Self {
        Self {
            entry: CrossoverLeg::DEFAULT_ENTRY,
            exit: CrossoverLeg::DEFAULT_EXIT,
        }
    }
}
