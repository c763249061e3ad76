//! Auxiliary price filter: price must sit above/below its own moving average.

use crate::domain::{Comparison, MaKind, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxiliaryPriceFilter {
    pub enabled: bool,
    pub ma_kind: MaKind,
    pub period: Period,
    pub comparison: Comparison,
}

impl AuxiliaryPriceFilter {
    pub const DEFAULT_PERIOD: Period = Period::lit(200);

    pub fn apply(&mut self, edit: PriceFilterEdit) {
        match edit {
            PriceFilterEdit::Enabled(enabled) => self.enabled = enabled,
            PriceFilterEdit::MaKind(kind) => self.ma_kind = kind,
            PriceFilterEdit::Period(period) => self.period = period,
            PriceFilterEdit::Comparison(comparison) => self.comparison = comparison,
        }
    }
}

impl Default for AuxiliaryPriceFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            ma_kind: MaKind::Sma,
            period: Self::DEFAULT_PERIOD,
            comparison: Comparison::Above,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFilterEdit {
    Enabled(bool),
    MaKind(MaKind),
    Period(Period),
    Comparison(Comparison),
}
