//! Crossover between moving averages of two independently chosen datasets.
//!
//! A third dataset supplies the USD price used for valuation only; it is never
//! a signal input. Take-profit and stop-loss apply in addition to the exit
//! crossover. Which trigger wins when several fire on the same bar is decided
//! by the execution engine, not here.

use crate::domain::{DatasetId, Direction, MaKind, Period, Series};

/// One input of a multi-dataset crossover: dataset, column, and its average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSource {
    pub dataset_id: DatasetId,
    pub series: Series,
    pub ma_kind: MaKind,
    pub period: Period,
}

impl SeriesSource {
    pub const DEFAULT_A_PERIOD: Period = Period::lit(7);
    pub const DEFAULT_B_PERIOD: Period = Period::lit(30);

    fn with_period(period: Period) -> Self {
        Self {
            dataset_id: DatasetId::NONE,
            series: Series::Indicator,
            ma_kind: MaKind::Sma,
            period,
        }
    }

    pub fn apply(&mut self, edit: SeriesSourceEdit) {
        match edit {
            SeriesSourceEdit::Dataset(id) => self.dataset_id = id,
            SeriesSourceEdit::Series(series) => self.series = series,
            SeriesSourceEdit::MaKind(kind) => self.ma_kind = kind,
            SeriesSourceEdit::Period(period) => self.period = period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSourceEdit {
    Dataset(DatasetId),
    Series(Series),
    MaKind(MaKind),
    Period(Period),
}

/// A percentage exit trigger measured from the position's entry price.
///
/// `pct` is in percent units (`3.0` = 3 %) and always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimit {
    pub enabled: bool,
    pct: f64,
}

impl RiskLimit {
    pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 3.0;
    pub const DEFAULT_STOP_LOSS_PCT: f64 = 1.0;

    pub fn disabled(pct: f64) -> Self {
        let mut limit = Self {
            enabled: false,
            pct: 1.0,
        };
        limit.set_pct(pct);
        limit
    }

    pub fn pct(&self) -> f64 {
        self.pct
    }

    /// Non-positive or non-finite input keeps the previous value.
    pub fn set_pct(&mut self, pct: f64) {
        if pct.is_finite() && pct > 0.0 {
            self.pct = pct;
        }
    }

    /// The percentage that takes effect, `None` while disabled.
    pub fn active_pct(&self) -> Option<f64> {
        self.enabled.then_some(self.pct)
    }

    pub fn apply(&mut self, edit: RiskLimitEdit) {
        match edit {
            RiskLimitEdit::Enabled(enabled) => self.enabled = enabled,
            RiskLimitEdit::Pct(pct) => self.set_pct(pct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskLimitEdit {
    Enabled(bool),
    Pct(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiDatasetCrossoverCondition {
    pub dataset_a: SeriesSource,
    pub dataset_b: SeriesSource,
    pub entry_direction: Direction,
    pub exit_direction: Direction,
    pub price_dataset_id: DatasetId,
    pub take_profit: RiskLimit,
    pub stop_loss: RiskLimit,
}

impl Default for MultiDatasetCrossoverCondition {
    fn default() -> Self {
        Self {
            dataset_a: SeriesSource::with_period(SeriesSource::DEFAULT_A_PERIOD),
            dataset_b: SeriesSource::with_period(SeriesSource::DEFAULT_B_PERIOD),
            entry_direction: Direction::Up,
            exit_direction: Direction::Down,
            price_dataset_id: DatasetId::NONE,
            take_profit: RiskLimit::disabled(RiskLimit::DEFAULT_TAKE_PROFIT_PCT),
            stop_loss: RiskLimit::disabled(RiskLimit::DEFAULT_STOP_LOSS_PCT),
        }
    }
}

/// Which input of a multi-dataset crossover an edit or report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLeg {
    A,
    B,
}

impl MultiDatasetCrossoverCondition {
    pub fn source_mut(&mut self, leg: SourceLeg) -> &mut SeriesSource {
        match leg {
            SourceLeg::A => &mut self.dataset_a,
            SourceLeg::B => &mut self.dataset_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_limits_start_disabled() {
        let m = MultiDatasetCrossoverCondition::default();
        assert_eq!(m.take_profit.active_pct(), None);
        assert_eq!(m.take_profit.pct(), 3.0);
        assert_eq!(m.stop_loss.pct(), 1.0);
    }

    #[test]
    fn non_positive_pct_is_ignored() {
        let mut limit = RiskLimit::disabled(2.5);
        limit.apply(RiskLimitEdit::Pct(0.0));
        limit.apply(RiskLimitEdit::Pct(-4.0));
        limit.apply(RiskLimitEdit::Pct(f64::NAN));
        assert_eq!(limit.pct(), 2.5);
        limit.apply(RiskLimitEdit::Enabled(true));
        assert_eq!(limit.active_pct(), Some(2.5));
    }

    #[test]
    fn sources_are_independent() {
        let mut m = MultiDatasetCrossoverCondition::default();
        m.source_mut(SourceLeg::B)
            .apply(SeriesSourceEdit::Series(Series::Price));
        assert_eq!(m.dataset_a.series, Series::Indicator);
        assert_eq!(m.dataset_b.series, Series::Price);
    }
}
