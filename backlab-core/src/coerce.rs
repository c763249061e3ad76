//! Field-level coercion of raw text input.
//!
//! Numeric parse failures never produce `NaN` and never raise. Condition
//! fields fall back to their documented default; transform periods fall back
//! to the previous valid value. No cross-field checks happen here.

use crate::condition::{
    AuxiliaryPriceFilter, Condition, ConditionEdit, CrossoverLeg, CrossoverLegEdit,
    PriceFilterEdit, RiskLimit, RiskLimitEdit, SeriesSource, SeriesSourceEdit, SourceLeg,
    ThresholdCondition,
};
use crate::domain::{DatasetId, Period};
use crate::transform::TransformEdit;

/// Parse a finite number; `None` for empty, garbage, `NaN` or infinities.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a period, truncating fractions (`"7.9"` → 7). `None` below 1.
pub fn parse_period(raw: &str) -> Option<Period> {
    let value = parse_number(raw)?.trunc();
    if value < 1.0 {
        return None;
    }
    Period::new(value.min(u32::MAX as f64) as u32)
}

/// Parse a dataset selector; anything unparseable means "none selected".
pub fn parse_dataset(raw: &str) -> DatasetId {
    raw.trim()
        .parse::<u64>()
        .map(DatasetId)
        .unwrap_or(DatasetId::NONE)
}

/// Every free-text input of a condition form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Dataset,
    IndicatorTransformPeriod,
    PriceTransformPeriod,
    PriceFilterPeriod,
    ThresholdEntry,
    ThresholdExit,
    EntryFastPeriod,
    EntrySlowPeriod,
    ExitFastPeriod,
    ExitSlowPeriod,
    SourceDataset(SourceLeg),
    SourcePeriod(SourceLeg),
    PriceDataset,
    TakeProfitPct,
    StopLossPct,
}

impl TextField {
    /// Turn raw text into an edit, substituting the field's fallback on failure.
    pub fn to_edit(self, raw: &str, current: &Condition) -> ConditionEdit {
        match self {
            TextField::Dataset => ConditionEdit::Dataset(parse_dataset(raw)),
            TextField::IndicatorTransformPeriod => {
                let previous = current.transforms.indicator.stored_period();
                ConditionEdit::IndicatorTransform(TransformEdit::Period(
                    parse_period(raw).unwrap_or(previous),
                ))
            }
            TextField::PriceTransformPeriod => {
                let previous = current.transforms.price.stored_period();
                ConditionEdit::PriceTransform(TransformEdit::Period(
                    parse_period(raw).unwrap_or(previous),
                ))
            }
            TextField::PriceFilterPeriod => ConditionEdit::PriceFilter(PriceFilterEdit::Period(
                parse_period(raw).unwrap_or(AuxiliaryPriceFilter::DEFAULT_PERIOD),
            )),
            TextField::ThresholdEntry => ConditionEdit::ThresholdEntry(
                parse_number(raw).unwrap_or(ThresholdCondition::DEFAULT_LEVEL),
            ),
            TextField::ThresholdExit => ConditionEdit::ThresholdExit(
                parse_number(raw).unwrap_or(ThresholdCondition::DEFAULT_LEVEL),
            ),
            TextField::EntryFastPeriod => ConditionEdit::CrossoverEntry(
                CrossoverLegEdit::FastPeriod(
                    parse_period(raw).unwrap_or(CrossoverLeg::DEFAULT_ENTRY.fast_period),
                ),
            ),
            TextField::EntrySlowPeriod => ConditionEdit::CrossoverEntry(
                CrossoverLegEdit::SlowPeriod(
                    parse_period(raw).unwrap_or(CrossoverLeg::DEFAULT_ENTRY.slow_period),
                ),
            ),
            TextField::ExitFastPeriod => ConditionEdit::CrossoverExit(
                CrossoverLegEdit::FastPeriod(
                    parse_period(raw).unwrap_or(CrossoverLeg::DEFAULT_EXIT.fast_period),
                ),
            ),
            TextField::ExitSlowPeriod => ConditionEdit::CrossoverExit(
                CrossoverLegEdit::SlowPeriod(
                    parse_period(raw).unwrap_or(CrossoverLeg::DEFAULT_EXIT.slow_period),
                ),
            ),
            TextField::SourceDataset(leg) => {
                ConditionEdit::Source(leg, SeriesSourceEdit::Dataset(parse_dataset(raw)))
            }
            TextField::SourcePeriod(leg) => {
                let default = match leg {
                    SourceLeg::A => SeriesSource::DEFAULT_A_PERIOD,
                    SourceLeg::B => SeriesSource::DEFAULT_B_PERIOD,
                };
                ConditionEdit::Source(
                    leg,
                    SeriesSourceEdit::Period(parse_period(raw).unwrap_or(default)),
                )
            }
            TextField::PriceDataset => ConditionEdit::PriceDataset(parse_dataset(raw)),
            TextField::TakeProfitPct => ConditionEdit::TakeProfit(RiskLimitEdit::Pct(
                parse_positive(raw).unwrap_or(RiskLimit::DEFAULT_TAKE_PROFIT_PCT),
            )),
            TextField::StopLossPct => ConditionEdit::StopLoss(RiskLimitEdit::Pct(
                parse_positive(raw).unwrap_or(RiskLimit::DEFAULT_STOP_LOSS_PCT),
            )),
        }
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| *v > 0.0)
}
