//! Strategy drafts stored as TOML.
//!
//! A draft is not a second representation of builder state: it is replayed
//! through the reducer as the [`Action`]s a user would have performed. Every field is optional; omitted fields keep the
//! defaults a freshly added condition has.
//!
//! ```toml
//! mode = "composite"
//! strictness = "warn"
//!
//! [params]
//! window = "1y"
//! initial_capital = 5000.0
//!
//! [[conditions]]
//! kind = "crossover"
//! dataset = 1
//! crossover.entry = { fast_period = 5, slow_period = 20 }
//!
//! [[conditions]]
//! combinator = "OR"
//! kind = "threshold"
//! dataset = 2
//! threshold_entry = 10.0
//! threshold_exit = 5.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::builder::{Action, BuilderState, CompositeStrategyBuilder, StrategyMode};
use crate::condition::{
    ConditionEdit, ConditionKind, CrossoverLegEdit, PriceFilterEdit, RiskLimitEdit,
    SeriesSourceEdit, SourceLeg,
};
use crate::domain::{Comparison, DatasetId, Direction, MaKind, Period, Series};
use crate::evaluation::Combinator;
use crate::params::{BacktestWindow, CommonParamEdit};
use crate::readiness::Strictness;
use crate::transform::{TransformEdit, TransformKind};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("read draft {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse draft: {0}")]
    Parse(#[from] toml::de::Error),
}

// ─── File shape ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyDraft {
    #[serde(default)]
    pub mode: StrategyMode,
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub params: ParamsDraft,
    #[serde(default)]
    pub conditions: Vec<ConditionDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsDraft {
    pub window: Option<BacktestWindow>,
    pub initial_capital: Option<f64>,
    pub fee_rate: Option<f64>,
    pub slippage_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDraft {
    pub kind: Option<ConditionKind>,
    /// Ignored on the first condition.
    pub combinator: Option<Combinator>,
    pub dataset: Option<DatasetId>,
    pub apply_to: Option<Series>,
    pub indicator_transform: Option<TransformDraft>,
    pub price_transform: Option<TransformDraft>,
    pub price_filter: Option<PriceFilterDraft>,
    pub threshold_entry: Option<f64>,
    pub threshold_exit: Option<f64>,
    pub crossover: Option<CrossoverDraft>,
    pub multi_dataset: Option<MultiDatasetDraft>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformDraft {
    #[serde(rename = "type")]
    pub kind: Option<TransformKind>,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceFilterDraft {
    pub enabled: Option<bool>,
    pub ma_type: Option<MaKind>,
    pub period: Option<Period>,
    pub condition: Option<Comparison>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossoverDraft {
    pub entry: Option<LegDraft>,
    pub exit: Option<LegDraft>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegDraft {
    pub fast_period: Option<Period>,
    pub slow_period: Option<Period>,
    pub ma_type: Option<MaKind>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiDatasetDraft {
    pub dataset_a: Option<SourceDraft>,
    pub dataset_b: Option<SourceDraft>,
    pub entry_direction: Option<Direction>,
    pub exit_direction: Option<Direction>,
    pub price_dataset: Option<DatasetId>,
    pub take_profit: Option<RiskDraft>,
    pub stop_loss: Option<RiskDraft>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDraft {
    pub id: Option<DatasetId>,
    pub series: Option<Series>,
    pub ma_type: Option<MaKind>,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskDraft {
    pub enabled: Option<bool>,
    pub pct: Option<f64>,
}

// ─── Loading ─────────────────────────────────────────────────────────

impl StrategyDraft {
    pub fn from_toml(content: &str) -> Result<Self, DraftError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, DraftError> {
        let content = std::fs::read_to_string(path).map_err(|source| DraftError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Replay this draft onto `builder` as the reducer actions a user would
    /// perform. Each condition's edits target the id the builder just
    /// allocated for it, so existing conditions are left alone.
    pub fn replay(&self, builder: &mut CompositeStrategyBuilder) {
        builder.dispatch(Action::SetMode(self.mode));
        builder.dispatch_all(self.params.edits().into_iter().map(Action::SetCommonParam));
        for condition in &self.conditions {
            builder.dispatch(Action::AddCondition);
            let edits = condition.edits();
            match builder.state().last_id() {
                Some(id) if !edits.is_empty() => {
                    builder.dispatch(Action::UpdateCondition { id, edits })
                }
                _ => {}
            }
        }
    }

    pub fn into_builder(self) -> CompositeStrategyBuilder {
        let mut builder = CompositeStrategyBuilder::new(BuilderState::default(), self.strictness);
        self.replay(&mut builder);
        tracing::debug!(
            conditions = builder.state().len(),
            mode = %builder.state().mode(),
            "draft loaded"
        );
        builder
    }
}

impl ParamsDraft {
    fn edits(&self) -> Vec<CommonParamEdit> {
        let mut edits = Vec::new();
        if let Some(window) = self.window {
            edits.push(CommonParamEdit::Window(window));
        }
        if let Some(capital) = self.initial_capital {
            edits.push(CommonParamEdit::InitialCapital(capital));
        }
        if let Some(rate) = self.fee_rate {
            edits.push(CommonParamEdit::FeeRate(rate));
        }
        if let Some(rate) = self.slippage_rate {
            edits.push(CommonParamEdit::SlippageRate(rate));
        }
        edits
    }
}

impl ConditionDraft {
    fn edits(&self) -> Vec<ConditionEdit> {
        let mut edits = Vec::new();
        // Kind goes last: earlier variant edits land in the stash and the
        // switch restores them.
        if let Some(op) = self.combinator {
            edits.push(ConditionEdit::Combinator(op));
        }
        if let Some(id) = self.dataset {
            edits.push(ConditionEdit::Dataset(id));
        }
        if let Some(series) = self.apply_to {
            edits.push(ConditionEdit::AppliedSeries(series));
        }
        if let Some(t) = self.indicator_transform {
            edits.extend(t.edits().into_iter().map(ConditionEdit::IndicatorTransform));
        }
        if let Some(t) = self.price_transform {
            edits.extend(t.edits().into_iter().map(ConditionEdit::PriceTransform));
        }
        if let Some(f) = self.price_filter {
            edits.extend(f.edits().into_iter().map(ConditionEdit::PriceFilter));
        }
        if let Some(level) = self.threshold_entry {
            edits.push(ConditionEdit::ThresholdEntry(level));
        }
        if let Some(level) = self.threshold_exit {
            edits.push(ConditionEdit::ThresholdExit(level));
        }
        if let Some(c) = self.crossover {
            if let Some(leg) = c.entry {
                edits.extend(leg.edits().into_iter().map(ConditionEdit::CrossoverEntry));
            }
            if let Some(leg) = c.exit {
                edits.extend(leg.edits().into_iter().map(ConditionEdit::CrossoverExit));
            }
        }
        if let Some(m) = self.multi_dataset {
            m.push_edits(&mut edits);
        }
        if let Some(kind) = self.kind {
            edits.push(ConditionEdit::Kind(kind));
        }
        edits
    }
}

impl TransformDraft {
    fn edits(&self) -> Vec<TransformEdit> {
        let mut edits = Vec::new();
        if let Some(kind) = self.kind {
            edits.push(TransformEdit::Kind(kind));
        }
        if let Some(period) = self.period {
            edits.push(TransformEdit::Period(period));
        }
        edits
    }
}

impl PriceFilterDraft {
    fn edits(&self) -> Vec<PriceFilterEdit> {
        let mut edits = Vec::new();
        if let Some(enabled) = self.enabled {
            edits.push(PriceFilterEdit::Enabled(enabled));
        }
        if let Some(kind) = self.ma_type {
            edits.push(PriceFilterEdit::MaKind(kind));
        }
        if let Some(period) = self.period {
            edits.push(PriceFilterEdit::Period(period));
        }
        if let Some(comparison) = self.condition {
            edits.push(PriceFilterEdit::Comparison(comparison));
        }
        edits
    }
}

impl LegDraft {
    fn edits(&self) -> Vec<CrossoverLegEdit> {
        let mut edits = Vec::new();
        if let Some(p) = self.fast_period {
            edits.push(CrossoverLegEdit::FastPeriod(p));
        }
        if let Some(p) = self.slow_period {
            edits.push(CrossoverLegEdit::SlowPeriod(p));
        }
        if let Some(kind) = self.ma_type {
            edits.push(CrossoverLegEdit::MaKind(kind));
        }
        if let Some(d) = self.direction {
            edits.push(CrossoverLegEdit::Direction(d));
        }
        edits
    }
}

impl SourceDraft {
    fn edits(&self) -> Vec<SeriesSourceEdit> {
        let mut edits = Vec::new();
        if let Some(id) = self.id {
            edits.push(SeriesSourceEdit::Dataset(id));
        }
        if let Some(series) = self.series {
            edits.push(SeriesSourceEdit::Series(series));
        }
        if let Some(kind) = self.ma_type {
            edits.push(SeriesSourceEdit::MaKind(kind));
        }
        if let Some(p) = self.period {
            edits.push(SeriesSourceEdit::Period(p));
        }
        edits
    }
}

impl RiskDraft {
    fn edits(&self) -> Vec<RiskLimitEdit> {
        let mut edits = Vec::new();
        if let Some(enabled) = self.enabled {
            edits.push(RiskLimitEdit::Enabled(enabled));
        }
        if let Some(pct) = self.pct {
            edits.push(RiskLimitEdit::Pct(pct));
        }
        edits
    }
}

impl MultiDatasetDraft {
    fn push_edits(&self, edits: &mut Vec<ConditionEdit>) {
        for (leg, source) in [(SourceLeg::A, self.dataset_a), (SourceLeg::B, self.dataset_b)] {
            if let Some(source) = source {
                edits.extend(source.edits().into_iter().map(|e| ConditionEdit::Source(leg, e)));
            }
        }
        if let Some(d) = self.entry_direction {
            edits.push(ConditionEdit::EntryDirection(d));
        }
        if let Some(d) = self.exit_direction {
            edits.push(ConditionEdit::ExitDirection(d));
        }
        if let Some(id) = self.price_dataset {
            edits.push(ConditionEdit::PriceDataset(id));
        }
        if let Some(r) = self.take_profit {
            edits.extend(r.edits().into_iter().map(ConditionEdit::TakeProfit));
        }
        if let Some(r) = self.stop_loss {
            edits.extend(r.edits().into_iter().map(ConditionEdit::StopLoss));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::StrategyVariant;
    use std::io::Write;

    const SAMPLE: &str = r#"
mode = "composite"
strictness = "warn"

[params]
window = "1y"
initial_capital = 5000.0

[[conditions]]
kind = "crossover"
dataset = 1
crossover.entry = { fast_period = 5, slow_period = 20 }

[[conditions]]
combinator = "OR"
dataset = 2
threshold_entry = 10.0
threshold_exit = 5.0
"#;

    #[test]
    fn sample_draft_replays_into_builder() {
        let builder = StrategyDraft::from_toml(SAMPLE).unwrap().into_builder();
        let state = builder.state();
        assert_eq!(state.mode(), StrategyMode::Composite);
        assert_eq!(builder.strictness(), Strictness::Warn);
        assert_eq!(state.params().window, BacktestWindow::Years(1));
        assert_eq!(state.params().initial_capital(), 5000.0);
        assert_eq!(state.combinators(), &[Combinator::Or]);

        match state.conditions()[0].variant() {
            StrategyVariant::Crossover(c) => {
                assert_eq!(c.entry.fast_period.get(), 5);
                assert_eq!(c.entry.slow_period.get(), 20);
                assert_eq!(c.exit.slow_period.get(), 14);
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert_eq!(state.conditions()[1].dataset_id, DatasetId(2));
    }

    #[test]
    fn replay_onto_a_used_builder_edits_only_new_conditions() {
        let mut builder = CompositeStrategyBuilder::default();
        builder.dispatch(Action::AddCondition);
        builder.dispatch(Action::AddCondition);
        let first = builder.state().conditions()[0].id();
        builder.dispatch(Action::RemoveCondition(first));

        StrategyDraft::from_toml(SAMPLE).unwrap().replay(&mut builder);

        let state = builder.state();
        assert_eq!(state.len(), 3);
        assert_eq!(state.conditions()[0].dataset_id, DatasetId::NONE);
        assert_eq!(state.conditions()[1].dataset_id, DatasetId(1));
        assert_eq!(state.conditions()[1].kind(), ConditionKind::Crossover);
        assert_eq!(state.conditions()[2].dataset_id, DatasetId(2));
        assert_eq!(state.combinators(), &[Combinator::And, Combinator::Or]);
    }

    #[test]
    fn empty_draft_is_an_empty_single_strategy() {
        let draft = StrategyDraft::from_toml("").unwrap();
        assert_eq!(draft, StrategyDraft::default());
        assert!(draft.into_builder().state().is_empty());
    }

    #[test]
    fn zero_period_is_a_parse_error() {
        let err = StrategyDraft::from_toml(
            "[[conditions]]\nindicator_transform = { type = \"sma\", period = 0 }\n",
        )
        .unwrap_err();
        assert!(matches!(err, DraftError::Parse(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(StrategyDraft::from_toml("[[conditions]]\nthreshold = 3\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let draft = StrategyDraft::from_path(file.path()).unwrap();
        assert_eq!(draft.conditions.len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StrategyDraft::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, DraftError::Io { .. }));
    }
}
