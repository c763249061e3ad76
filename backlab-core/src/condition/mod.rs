//! Atomic trading conditions.
//!
//! A [`Condition`] is a tagged union over three rule kinds plus the fields
//! every kind shares (dataset, transforms, applied series, price filter).
//! Only the active variant lives in [`Condition::variant`]; payloads of the
//! kinds the user switched away from are parked in a side stash keyed by kind,
//! so switching back restores them instead of resetting to defaults.
//!
//! State machine: `threshold` (initial) ⇄ `crossover` ⇄ `multi_dataset_crossover`,
//! driven only by [`ConditionEdit::Kind`]. There is no terminal state.

pub mod crossover;
pub mod multi_dataset;
pub mod price_filter;
pub mod threshold;

pub use crossover::{CrossoverLeg, CrossoverLegEdit, SingleCrossoverCondition};
pub use multi_dataset::{
    MultiDatasetCrossoverCondition, RiskLimit, RiskLimitEdit, SeriesSource, SeriesSourceEdit,
    SourceLeg,
};
pub use price_filter::{AuxiliaryPriceFilter, PriceFilterEdit};
pub use threshold::ThresholdCondition;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ConditionId, DatasetId, Direction, Series};
use crate::evaluation::Combinator;
use crate::transform::{SeriesTransforms, TransformEdit};

// ─── Kind ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    #[default]
    Threshold,
    Crossover,
    MultiDatasetCrossover,
}

impl ConditionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Threshold => "threshold",
            ConditionKind::Crossover => "crossover",
            ConditionKind::MultiDatasetCrossover => "multi_dataset_crossover",
        }
    }

    pub fn all() -> &'static [ConditionKind] {
        &[
            ConditionKind::Threshold,
            ConditionKind::Crossover,
            ConditionKind::MultiDatasetCrossover,
        ]
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Variant payloads ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyVariant {
    Threshold(ThresholdCondition),
    Crossover(SingleCrossoverCondition),
    MultiDatasetCrossover(MultiDatasetCrossoverCondition),
}

impl StrategyVariant {
    pub fn kind(&self) -> ConditionKind {
        match self {
            StrategyVariant::Threshold(_) => ConditionKind::Threshold,
            StrategyVariant::Crossover(_) => ConditionKind::Crossover,
            StrategyVariant::MultiDatasetCrossover(_) => ConditionKind::MultiDatasetCrossover,
        }
    }

    pub fn default_for(kind: ConditionKind) -> Self {
        match kind {
            ConditionKind::Threshold => StrategyVariant::Threshold(ThresholdCondition::default()),
            ConditionKind::Crossover => StrategyVariant::Crossover(SingleCrossoverCondition::default()),
            ConditionKind::MultiDatasetCrossover => {
                StrategyVariant::MultiDatasetCrossover(MultiDatasetCrossoverCondition::default())
            }
        }
    }
}

/// Payloads of inactive kinds, kept so a switch back restores them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct VariantStash {
    threshold: Option<ThresholdCondition>,
    crossover: Option<SingleCrossoverCondition>,
    multi_dataset: Option<MultiDatasetCrossoverCondition>,
}

impl VariantStash {
    fn put(&mut self, variant: StrategyVariant) {
        match variant {
            StrategyVariant::Threshold(t) => self.threshold = Some(t),
            StrategyVariant::Crossover(c) => self.crossover = Some(c),
            StrategyVariant::MultiDatasetCrossover(m) => self.multi_dataset = Some(m),
        }
    }

    fn take(&mut self, kind: ConditionKind) -> Option<StrategyVariant> {
        match kind {
            ConditionKind::Threshold => self.threshold.take().map(StrategyVariant::Threshold),
            ConditionKind::Crossover => self.crossover.take().map(StrategyVariant::Crossover),
            ConditionKind::MultiDatasetCrossover => self
                .multi_dataset
                .take()
                .map(StrategyVariant::MultiDatasetCrossover),
        }
    }
}

// ─── Edits ───────────────────────────────────────────────────────────

/// One field change on a condition.
///
/// Variant-specific edits always land on that variant's payload: the active
/// one if the kind matches, otherwise the stashed one (created from defaults
/// on first touch). Edits never switch the kind; only `Kind` does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionEdit {
    Kind(ConditionKind),
    Dataset(DatasetId),
    AppliedSeries(Series),
    IndicatorTransform(TransformEdit),
    PriceTransform(TransformEdit),
    PriceFilter(PriceFilterEdit),
    /// Handled by the builder, which anchors combinators to positions.
    Combinator(Combinator),
    ThresholdEntry(f64),
    ThresholdExit(f64),
    CrossoverEntry(CrossoverLegEdit),
    CrossoverExit(CrossoverLegEdit),
    Source(SourceLeg, SeriesSourceEdit),
    EntryDirection(Direction),
    ExitDirection(Direction),
    PriceDataset(DatasetId),
    TakeProfit(RiskLimitEdit),
    StopLoss(RiskLimitEdit),
}

// ─── Condition ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    id: ConditionId,
    pub dataset_id: DatasetId,
    pub transforms: SeriesTransforms,
    pub applied_series: Series,
    pub price_filter: AuxiliaryPriceFilter,
    variant: StrategyVariant,
    stash: VariantStash,
}

impl Condition {
    /// A fresh `threshold` condition with default field values.
    pub fn new(id: ConditionId) -> Self {
        Self {
            id,
            dataset_id: DatasetId::NONE,
            transforms: SeriesTransforms::default(),
            applied_series: Series::Indicator,
            price_filter: AuxiliaryPriceFilter::default(),
            variant: StrategyVariant::default_for(ConditionKind::Threshold),
            stash: VariantStash::default(),
        }
    }

    pub fn id(&self) -> ConditionId {
        self.id
    }

    pub fn kind(&self) -> ConditionKind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &StrategyVariant {
        &self.variant
    }

    /// Switch the active kind, parking the current payload.
    pub fn set_kind(&mut self, kind: ConditionKind) {
        if self.kind() == kind {
            return;
        }
        let restored = self
            .stash
            .take(kind)
            .unwrap_or_else(|| StrategyVariant::default_for(kind));
        let previous = std::mem::replace(&mut self.variant, restored);
        tracing::debug!(
            condition = %self.id,
            from = %previous.kind(),
            to = %kind,
            "condition kind switched"
        );
        self.stash.put(previous);
    }

    pub fn threshold(&self) -> Option<&ThresholdCondition> {
        match &self.variant {
            StrategyVariant::Threshold(t) => Some(t),
            _ => self.stash.threshold.as_ref(),
        }
    }

    pub fn crossover(&self) -> Option<&SingleCrossoverCondition> {
        match &self.variant {
            StrategyVariant::Crossover(c) => Some(c),
            _ => self.stash.crossover.as_ref(),
        }
    }

    pub fn multi_dataset(&self) -> Option<&MultiDatasetCrossoverCondition> {
        match &self.variant {
            StrategyVariant::MultiDatasetCrossover(m) => Some(m),
            _ => self.stash.multi_dataset.as_ref(),
        }
    }

    fn threshold_mut(&mut self) -> &mut ThresholdCondition {
        match &mut self.variant {
            StrategyVariant::Threshold(t) => t,
            _ => self.stash.threshold.get_or_insert_with(Default::default),
        }
    }

    fn crossover_mut(&mut self) -> &mut SingleCrossoverCondition {
        match &mut self.variant {
            StrategyVariant::Crossover(c) => c,
            _ => self.stash.crossover.get_or_insert_with(Default::default),
        }
    }

    fn multi_dataset_mut(&mut self) -> &mut MultiDatasetCrossoverCondition {
        match &mut self.variant {
            StrategyVariant::MultiDatasetCrossover(m) => m,
            _ => self.stash.multi_dataset.get_or_insert_with(Default::default),
        }
    }

    /// Apply one edit. `Combinator` is ignored here (see [`ConditionEdit`]).
    pub fn apply(&mut self, edit: ConditionEdit) {
        match edit {
            ConditionEdit::Kind(kind) => self.set_kind(kind),
            ConditionEdit::Dataset(id) => self.dataset_id = id,
            ConditionEdit::AppliedSeries(series) => self.applied_series = series,
            ConditionEdit::IndicatorTransform(e) => self.transforms.indicator.apply(e),
            ConditionEdit::PriceTransform(e) => self.transforms.price.apply(e),
            ConditionEdit::PriceFilter(e) => self.price_filter.apply(e),
            ConditionEdit::Combinator(_) => {}
            ConditionEdit::ThresholdEntry(level) => self.threshold_mut().set_entry(level),
            ConditionEdit::ThresholdExit(level) => self.threshold_mut().set_exit(level),
            ConditionEdit::CrossoverEntry(e) => self.crossover_mut().entry.apply(e),
            ConditionEdit::CrossoverExit(e) => self.crossover_mut().exit.apply(e),
            ConditionEdit::Source(leg, e) => self.multi_dataset_mut().source_mut(leg).apply(e),
            ConditionEdit::EntryDirection(d) => self.multi_dataset_mut().entry_direction = d,
            ConditionEdit::ExitDirection(d) => self.multi_dataset_mut().exit_direction = d,
            ConditionEdit::PriceDataset(id) => self.multi_dataset_mut().price_dataset_id = id,
            ConditionEdit::TakeProfit(e) => self.multi_dataset_mut().take_profit.apply(e),
            ConditionEdit::StopLoss(e) => self.multi_dataset_mut().stop_loss.apply(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;

    fn condition() -> Condition {
        Condition::new(ConditionId(1))
    }

    #[test]
    fn starts_as_threshold() {
        let c = condition();
        assert_eq!(c.kind(), ConditionKind::Threshold);
        assert_eq!(c.dataset_id, DatasetId::NONE);
        assert!(c.crossover().is_none());
    }

    #[test]
    fn switching_kind_and_back_restores_values() {
        let mut c = condition();
        c.apply(ConditionEdit::ThresholdEntry(10.0));
        c.apply(ConditionEdit::ThresholdExit(5.0));

        c.apply(ConditionEdit::Kind(ConditionKind::Crossover));
        assert_eq!(c.kind(), ConditionKind::Crossover);
        c.apply(ConditionEdit::CrossoverEntry(CrossoverLegEdit::FastPeriod(
            Period::new(3).unwrap(),
        )));

        c.apply(ConditionEdit::Kind(ConditionKind::Threshold));
        let t = c.threshold().unwrap();
        assert_eq!((t.entry, t.exit), (10.0, 5.0));

        c.apply(ConditionEdit::Kind(ConditionKind::Crossover));
        assert_eq!(c.crossover().unwrap().entry.fast_period.get(), 3);
    }

    #[test]
    fn edits_to_inactive_kind_land_in_stash() {
        let mut c = condition();
        c.apply(ConditionEdit::PriceDataset(DatasetId(3)));
        assert_eq!(c.kind(), ConditionKind::Threshold);
        assert_eq!(c.multi_dataset().unwrap().price_dataset_id, DatasetId(3));

        c.apply(ConditionEdit::Kind(ConditionKind::MultiDatasetCrossover));
        match c.variant() {
            StrategyVariant::MultiDatasetCrossover(m) => {
                assert_eq!(m.price_dataset_id, DatasetId(3))
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn setting_same_kind_is_a_no_op() {
        let mut c = condition();
        c.apply(ConditionEdit::ThresholdEntry(1.5));
        c.set_kind(ConditionKind::Threshold);
        assert_eq!(c.threshold().unwrap().entry, 1.5);
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ConditionKind::MultiDatasetCrossover).unwrap(),
            "\"multi_dataset_crossover\""
        );
    }
}
