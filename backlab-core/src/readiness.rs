//! Submit gating.
//!
//! Two separate checks:
//! - [`readiness`]: hard incompleteness (nothing to run, no dataset chosen).
//!   Never an error during editing; it only disables submission.
//! - [`lint`]: soft cross-field warnings (fast ≥ slow, entry = exit, ...).
//!   Whether they matter is decided by [`Strictness`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::builder::BuilderState;
use crate::condition::{CrossoverLeg, SeriesSource, SourceLeg, StrategyVariant};
use crate::domain::ConditionId;

// ─── Incompleteness ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Incomplete {
    #[error("no conditions to run")]
    NoConditions,
    #[error("condition {condition}: no dataset selected")]
    MissingDataset { condition: ConditionId },
    #[error("condition {condition}: no dataset selected for series {leg:?}")]
    MissingSeriesDataset {
        condition: ConditionId,
        leg: SourceLeg,
    },
    #[error("condition {condition}: no price dataset selected")]
    MissingPriceDataset { condition: ConditionId },
}

/// Everything that blocks submission of the conditions the current mode sends.
pub fn readiness(state: &BuilderState) -> Result<(), Vec<Incomplete>> {
    let conditions = state.submitted_conditions();
    if conditions.is_empty() {
        return Err(vec![Incomplete::NoConditions]);
    }

    let mut missing = Vec::new();
    for condition in conditions {
        let id = condition.id();
        match condition.variant() {
            StrategyVariant::MultiDatasetCrossover(m) => {
                if !m.dataset_a.dataset_id.is_selected() {
                    missing.push(Incomplete::MissingSeriesDataset {
                        condition: id,
                        leg: SourceLeg::A,
                    });
                }
                if !m.dataset_b.dataset_id.is_selected() {
                    missing.push(Incomplete::MissingSeriesDataset {
                        condition: id,
                        leg: SourceLeg::B,
                    });
                }
                if !m.price_dataset_id.is_selected() {
                    missing.push(Incomplete::MissingPriceDataset { condition: id });
                }
            }
            StrategyVariant::Threshold(_) | StrategyVariant::Crossover(_) => {
                if !condition.dataset_id.is_selected() {
                    missing.push(Incomplete::MissingDataset { condition: id });
                }
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

// ─── Lints ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Entry,
    Exit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Entry => f.write_str("entry"),
            Phase::Exit => f.write_str("exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Lint {
    #[error("condition {condition}: {phase} fast period {fast} is not below slow period {slow}")]
    FastNotBelowSlow {
        condition: ConditionId,
        phase: Phase,
        fast: u32,
        slow: u32,
    },
    #[error("condition {condition}: entry and exit thresholds are equal")]
    EqualThresholds { condition: ConditionId },
    #[error("condition {condition}: entry and exit cross in the same direction")]
    SameDirection { condition: ConditionId },
    #[error("condition {condition}: series A and B are the same source")]
    IdenticalSources { condition: ConditionId },
    #[error(
        "condition {condition}: take-profit and stop-loss both enabled; \
         same-bar precedence is decided by the engine"
    )]
    CompetingExits { condition: ConditionId },
}

/// Cross-field warnings for the submitted conditions. Never blocks on its own.
pub fn lint(state: &BuilderState) -> Vec<Lint> {
    let mut lints = Vec::new();
    for condition in state.submitted_conditions() {
        let id = condition.id();
        match condition.variant() {
            StrategyVariant::Threshold(t) => {
                if t.entry == t.exit {
                    lints.push(Lint::EqualThresholds { condition: id });
                }
            }
            StrategyVariant::Crossover(c) => {
                lint_leg(&mut lints, id, Phase::Entry, &c.entry);
                lint_leg(&mut lints, id, Phase::Exit, &c.exit);
                if c.entry.direction == c.exit.direction {
                    lints.push(Lint::SameDirection { condition: id });
                }
            }
            StrategyVariant::MultiDatasetCrossover(m) => {
                if m.entry_direction == m.exit_direction {
                    lints.push(Lint::SameDirection { condition: id });
                }
                if same_source(&m.dataset_a, &m.dataset_b) {
                    lints.push(Lint::IdenticalSources { condition: id });
                }
                if m.take_profit.enabled && m.stop_loss.enabled {
                    lints.push(Lint::CompetingExits { condition: id });
                }
            }
        }
    }
    lints
}

/// Same selected dataset, column and average kind. Periods may differ.
fn same_source(a: &SeriesSource, b: &SeriesSource) -> bool {
    a.dataset_id.is_selected()
        && a.dataset_id == b.dataset_id
        && a.series == b.series
        && a.ma_kind == b.ma_kind
}

fn lint_leg(lints: &mut Vec<Lint>, condition: ConditionId, phase: Phase, leg: &CrossoverLeg) {
    if leg.fast_period >= leg.slow_period {
        lints.push(Lint::FastNotBelowSlow {
            condition,
            phase,
            fast: leg.fast_period.get(),
            slow: leg.slow_period.get(),
        });
    }
}

// ─── Strictness ──────────────────────────────────────────────────────

/// How lints affect submission.
///
/// `Permissive` ignores them, `Warn` reports them without blocking, `Strict`
/// blocks on any lint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Permissive,
    Warn,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strictness '{0}' (expected permissive, warn or strict)")]
pub struct UnknownStrictness(pub String);

impl FromStr for Strictness {
    type Err = UnknownStrictness;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Strictness::Permissive),
            "warn" => Ok(Strictness::Warn),
            "strict" => Ok(Strictness::Strict),
            _ => Err(UnknownStrictness(s.to_string())),
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strictness::Permissive => f.write_str("permissive"),
            Strictness::Warn => f.write_str("warn"),
            Strictness::Strict => f.write_str("strict"),
        }
    }
}

// ─── Gate ────────────────────────────────────────────────────────────

/// Outcome of the submit check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitGate {
    pub missing: Vec<Incomplete>,
    /// Lints surfaced under the current strictness (empty when permissive).
    pub warnings: Vec<Lint>,
    pub blocked_by_lints: bool,
}

impl SubmitGate {
    pub fn can_submit(&self) -> bool {
        self.missing.is_empty() && !self.blocked_by_lints
    }
}

pub fn gate(state: &BuilderState, strictness: Strictness) -> SubmitGate {
    let missing = readiness(state).err().unwrap_or_default();
    let warnings = match strictness {
        Strictness::Permissive => Vec::new(),
        Strictness::Warn | Strictness::Strict => lint(state),
    };
    let blocked_by_lints = strictness == Strictness::Strict && !warnings.is_empty();
    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), %strictness, "strategy lints");
    }
    SubmitGate {
        missing,
        warnings,
        blocked_by_lints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{apply, Action, StrategyMode};
    use crate::condition::{ConditionEdit, ConditionKind, RiskLimitEdit};
    use crate::domain::DatasetId;

    fn single(edits: Vec<ConditionEdit>) -> BuilderState {
        let state = apply(BuilderState::default(), Action::AddCondition);
        let id = state.last_id().unwrap();
        apply(state, Action::UpdateCondition { id, edits })
    }

    #[test]
    fn empty_builder_cannot_submit() {
        let state = apply(BuilderState::default(), Action::SetMode(StrategyMode::Composite));
        assert_eq!(readiness(&state), Err(vec![Incomplete::NoConditions]));
        assert!(!gate(&state, Strictness::Permissive).can_submit());
    }

    #[test]
    fn missing_dataset_blocks() {
        let state = single(vec![]);
        let id = state.last_id().unwrap();
        assert_eq!(
            readiness(&state),
            Err(vec![Incomplete::MissingDataset { condition: id }])
        );
        let ready = single(vec![ConditionEdit::Dataset(DatasetId(1))]);
        assert_eq!(readiness(&ready), Ok(()));
    }

    #[test]
    fn multi_dataset_needs_all_three_datasets() {
        let state = single(vec![
            ConditionEdit::Kind(ConditionKind::MultiDatasetCrossover),
            ConditionEdit::Source(
                SourceLeg::A,
                crate::condition::SeriesSourceEdit::Dataset(DatasetId(1)),
            ),
        ]);
        let id = state.last_id().unwrap();
        assert_eq!(
            readiness(&state),
            Err(vec![
                Incomplete::MissingSeriesDataset {
                    condition: id,
                    leg: SourceLeg::B
                },
                Incomplete::MissingPriceDataset { condition: id },
            ])
        );
    }

    #[test]
    fn default_threshold_lints_equal_levels() {
        let state = single(vec![ConditionEdit::Dataset(DatasetId(1))]);
        let lints = lint(&state);
        assert_eq!(lints.len(), 1);
        assert!(matches!(lints[0], Lint::EqualThresholds { .. }));
    }

    #[test]
    fn strictness_decides_whether_lints_block() {
        let state = single(vec![ConditionEdit::Dataset(DatasetId(1))]);
        assert!(gate(&state, Strictness::Permissive).can_submit());
        assert!(gate(&state, Strictness::Permissive).warnings.is_empty());

        let warn = gate(&state, Strictness::Warn);
        assert!(warn.can_submit());
        assert_eq!(warn.warnings.len(), 1);

        assert!(!gate(&state, Strictness::Strict).can_submit());
    }

    #[test]
    fn competing_exits_are_flagged() {
        let state = single(vec![
            ConditionEdit::Kind(ConditionKind::MultiDatasetCrossover),
            ConditionEdit::TakeProfit(RiskLimitEdit::Enabled(true)),
            ConditionEdit::StopLoss(RiskLimitEdit::Enabled(true)),
        ]);
        let lints = lint(&state);
        assert!(lints.iter().any(|l| matches!(l, Lint::CompetingExits { .. })));
        // no dataset chosen yet on either side
        assert!(!lints.iter().any(|l| matches!(l, Lint::IdenticalSources { .. })));
    }

    #[test]
    fn same_dataset_series_and_ma_is_flagged_whatever_the_periods() {
        use crate::condition::SeriesSourceEdit;

        let state = single(vec![
            ConditionEdit::Kind(ConditionKind::MultiDatasetCrossover),
            ConditionEdit::Source(SourceLeg::A, SeriesSourceEdit::Dataset(DatasetId(1))),
            ConditionEdit::Source(SourceLeg::B, SeriesSourceEdit::Dataset(DatasetId(1))),
        ]);
        let lints = lint(&state);
        assert!(lints.iter().any(|l| matches!(l, Lint::IdenticalSources { .. })));

        let state = single(vec![
            ConditionEdit::Kind(ConditionKind::MultiDatasetCrossover),
            ConditionEdit::Source(SourceLeg::A, SeriesSourceEdit::Dataset(DatasetId(1))),
            ConditionEdit::Source(SourceLeg::B, SeriesSourceEdit::Dataset(DatasetId(1))),
            ConditionEdit::Source(SourceLeg::B, SeriesSourceEdit::Series(crate::domain::Series::Price)),
        ]);
        assert!(!lint(&state).iter().any(|l| matches!(l, Lint::IdenticalSources { .. })));
    }

    #[test]
    fn strictness_parses_case_insensitively() {
        assert_eq!("Strict".parse::<Strictness>(), Ok(Strictness::Strict));
        assert!("loose".parse::<Strictness>().is_err());
    }
}
