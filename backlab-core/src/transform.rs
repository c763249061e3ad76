//! Optional smoothing applied to a raw series before signal evaluation.
//!
//! Each condition carries two independent transforms, one for the indicator
//! column and one for the price column. Setting the kind or the period always
//! succeeds. A `none` transform still remembers its period so switching back
//! to a smoothing kind restores it, but [`TransformConfig::effective_period`]
//! hides it and the assembler only ever reads that.

use serde::{Deserialize, Serialize};

use crate::domain::{Period, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    None,
    Sma,
    Ema,
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformConfig {
    kind: TransformKind,
    period: Period,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            kind: TransformKind::None,
            period: Period::lit(1),
        }
    }
}

impl TransformConfig {
    pub fn new(kind: TransformKind, period: Period) -> Self {
        Self { kind, period }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// The stored period, including a stale one held while `kind` is `none`.
    pub fn stored_period(&self) -> Period {
        self.period
    }

    /// The period that takes effect, `None` when no smoothing is applied.
    pub fn effective_period(&self) -> Option<Period> {
        match self.kind {
            TransformKind::None => None,
            _ => Some(self.period),
        }
    }

    pub fn set_kind(&mut self, kind: TransformKind) {
        self.kind = kind;
    }

    pub fn set_period(&mut self, period: Period) {
        self.period = period;
    }

    pub fn apply(&mut self, edit: TransformEdit) {
        match edit {
            TransformEdit::Kind(kind) => self.set_kind(kind),
            TransformEdit::Period(period) => self.set_period(period),
        }
    }
}

/// A single field change on a [`TransformConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformEdit {
    Kind(TransformKind),
    Period(Period),
}

/// The indicator-column and price-column transforms of one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesTransforms {
    pub indicator: TransformConfig,
    pub price: TransformConfig,
}

impl SeriesTransforms {
    pub fn get(&self, series: Series) -> &TransformConfig {
        match series {
            Series::Indicator => &self.indicator,
            Series::Price => &self.price,
        }
    }

    pub fn get_mut(&mut self, series: Series) -> &mut TransformConfig {
        match series {
            Series::Indicator => &mut self.indicator,
            Series::Price => &mut self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_hides_stale_period() {
        let mut t = TransformConfig::default();
        t.set_period(Period::new(20).unwrap());
        assert_eq!(t.effective_period(), None);
        assert_eq!(t.stored_period().get(), 20);
    }

    #[test]
    fn switching_back_restores_period() {
        let mut t = TransformConfig::new(TransformKind::Ema, Period::new(9).unwrap());
        t.apply(TransformEdit::Kind(TransformKind::None));
        assert_eq!(t.effective_period(), None);
        t.apply(TransformEdit::Kind(TransformKind::Median));
        assert_eq!(t.effective_period(), Period::new(9));
    }

    #[test]
    fn series_lookup() {
        let mut ts = SeriesTransforms::default();
        ts.get_mut(Series::Price).set_kind(TransformKind::Sma);
        assert_eq!(ts.price.kind(), TransformKind::Sma);
        assert_eq!(ts.get(Series::Indicator).kind(), TransformKind::None);
    }
}
