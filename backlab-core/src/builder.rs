//! Composite strategy builder: an explicit reducer over an ordered list of
//! conditions.
//!
//! [`apply`] is the only way state changes. Combinators are positional:
//! `combinators[i]` joins the condition at position `i + 1` onto everything
//! before it, so reordering conditions leaves the combinator list untouched
//! and each combinator stays with its slot rather than following the
//! condition that used to sit there.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assembler::assemble;
use crate::coerce::TextField;
use crate::condition::{Condition, ConditionEdit};
use crate::contract::BacktestRequest;
use crate::domain::ConditionId;
use crate::evaluation::Combinator;
use crate::params::{CommonField, CommonParamEdit, CommonParams};
use crate::readiness::{self, Strictness, SubmitGate};

// ─── Mode ────────────────────────────────────────────────────────────

/// `Single` submits the first condition on its own; `Composite` submits the
/// whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    #[default]
    Single,
    Composite,
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyMode::Single => f.write_str("single"),
            StrategyMode::Composite => f.write_str("composite"),
        }
    }
}

// ─── State ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BuilderState {
    mode: StrategyMode,
    conditions: Vec<Condition>,
    /// Always `conditions.len().saturating_sub(1)` long.
    combinators: Vec<Combinator>,
    params: CommonParams,
    next_id: u64,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            mode: StrategyMode::default(),
            conditions: Vec::new(),
            combinators: Vec::new(),
            params: CommonParams::default(),
            next_id: 1,
        }
    }
}

impl BuilderState {
    pub fn mode(&self) -> StrategyMode {
        self.mode
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    pub fn params(&self) -> &CommonParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn condition(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id() == id)
    }

    pub fn position(&self, id: ConditionId) -> Option<usize> {
        self.conditions.iter().position(|c| c.id() == id)
    }

    /// The chain as `(condition, combinator)` pairs; the first has none.
    pub fn links(&self) -> impl Iterator<Item = (&Condition, Option<Combinator>)> + '_ {
        self.conditions.iter().enumerate().map(|(i, c)| {
            let op = i.checked_sub(1).map(|j| self.combinators[j]);
            (c, op)
        })
    }

    /// Conditions that end up in the request for the current mode.
    pub fn submitted_conditions(&self) -> &[Condition] {
        match self.mode {
            StrategyMode::Single => &self.conditions[..self.conditions.len().min(1)],
            StrategyMode::Composite => &self.conditions,
        }
    }

    /// Id of the most recently added condition.
    pub fn last_id(&self) -> Option<ConditionId> {
        self.conditions.last().map(Condition::id)
    }

    fn allocate_id(&mut self) -> ConditionId {
        let id = ConditionId(self.next_id);
        self.next_id += 1;
        id
    }
}

// ─── Actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddCondition,
    RemoveCondition(ConditionId),
    /// Field-wise merge: only the listed edits are applied, in order.
    UpdateCondition {
        id: ConditionId,
        edits: Vec<ConditionEdit>,
    },
    /// Raw text for a numeric field, coerced with the field's fallback.
    EnterText {
        id: ConditionId,
        field: TextField,
        raw: String,
    },
    MoveCondition {
        from: usize,
        to: usize,
    },
    SetCommonParam(CommonParamEdit),
    EnterCommonText {
        field: CommonField,
        raw: String,
    },
    SetMode(StrategyMode),
}

/// Pure reducer. Unknown ids and out-of-range indices leave the state as is.
pub fn apply(mut state: BuilderState, action: Action) -> BuilderState {
    match action {
        Action::AddCondition => {
            let id = state.allocate_id();
            if !state.conditions.is_empty() {
                state.combinators.push(Combinator::default());
            }
            state.conditions.push(Condition::new(id));
            tracing::debug!(condition = %id, count = state.conditions.len(), "condition added");
        }
        Action::RemoveCondition(id) => match state.position(id) {
            Some(index) => {
                state.conditions.remove(index);
                // The removed slot's combinator goes; at index 0 the new
                // first condition drops the one it used to carry.
                let slot = index.saturating_sub(1);
                if slot < state.combinators.len() {
                    state.combinators.remove(slot);
                }
                tracing::debug!(condition = %id, index, "condition removed");
            }
            None => tracing::debug!(condition = %id, "remove ignored: unknown condition"),
        },
        Action::UpdateCondition { id, edits } => match state.position(id) {
            Some(index) => {
                for edit in edits {
                    update_at(&mut state, index, edit);
                }
            }
            None => tracing::debug!(condition = %id, "update ignored: unknown condition"),
        },
        Action::EnterText { id, field, raw } => match state.position(id) {
            Some(index) => {
                let edit = field.to_edit(&raw, &state.conditions[index]);
                update_at(&mut state, index, edit);
            }
            None => tracing::debug!(condition = %id, "text ignored: unknown condition"),
        },
        Action::MoveCondition { from, to } => {
            let len = state.conditions.len();
            if from < len && to < len {
                let moved = state.conditions.remove(from);
                state.conditions.insert(to, moved);
            } else {
                tracing::debug!(from, to, len, "move ignored: index out of range");
            }
        }
        Action::SetCommonParam(edit) => state.params.apply(edit),
        Action::EnterCommonText { field, raw } => state.params.apply_text(field, &raw),
        Action::SetMode(mode) => state.mode = mode,
    }
    state
}

fn update_at(state: &mut BuilderState, index: usize, edit: ConditionEdit) {
    match edit {
        ConditionEdit::Combinator(op) => match index.checked_sub(1) {
            Some(slot) => state.combinators[slot] = op,
            None => tracing::debug!("combinator ignored: first condition has none"),
        },
        other => state.conditions[index].apply(other),
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Owns the reducer state and keeps the assembled request in step with it.
#[derive(Debug, Clone)]
pub struct CompositeStrategyBuilder {
    state: BuilderState,
    strictness: Strictness,
    request: BacktestRequest,
}

impl Default for CompositeStrategyBuilder {
    fn default() -> Self {
        Self::new(BuilderState::default(), Strictness::default())
    }
}

impl CompositeStrategyBuilder {
    pub fn new(state: BuilderState, strictness: Strictness) -> Self {
        let request = assemble(&state);
        Self {
            state,
            strictness,
            request,
        }
    }

    /// Apply one action and re-run assembly against the new state.
    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = apply(state, action);
        self.request = assemble(&self.state);
    }

    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn request(&self) -> &BacktestRequest {
        &self.request
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn set_strictness(&mut self, strictness: Strictness) {
        self.strictness = strictness;
    }

    /// Whether submit is enabled, with the reasons if not.
    pub fn gate(&self) -> SubmitGate {
        readiness::gate(&self.state, self.strictness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionKind;
    use crate::domain::DatasetId;
    use crate::evaluation::Combinator::{And, Or};

    fn with_conditions(n: usize) -> BuilderState {
        (0..n).fold(BuilderState::default(), |s, _| apply(s, Action::AddCondition))
    }

    fn ids(state: &BuilderState) -> Vec<u64> {
        state.conditions().iter().map(|c| c.id().get()).collect()
    }

    #[test]
    fn add_assigns_fresh_ids_and_and_combinators() {
        let state = with_conditions(3);
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.combinators(), &[And, And]);
        assert_eq!(state.links().next().map(|(_, op)| op), Some(None));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let state = with_conditions(2);
        let state = apply(state, Action::RemoveCondition(ConditionId(2)));
        let state = apply(state, Action::AddCondition);
        assert_eq!(ids(&state), vec![1, 3]);
    }

    #[test]
    fn removing_first_drops_the_new_firsts_combinator() {
        let mut state = with_conditions(3);
        state = apply(
            state,
            Action::UpdateCondition {
                id: ConditionId(2),
                edits: vec![ConditionEdit::Combinator(Or)],
            },
        );
        state = apply(state, Action::RemoveCondition(ConditionId(1)));
        assert_eq!(ids(&state), vec![2, 3]);
        assert_eq!(state.combinators(), &[And]);
    }

    #[test]
    fn removing_middle_drops_its_own_combinator() {
        let mut state = with_conditions(3);
        state = apply(
            state,
            Action::UpdateCondition {
                id: ConditionId(3),
                edits: vec![ConditionEdit::Combinator(Or)],
            },
        );
        state = apply(state, Action::RemoveCondition(ConditionId(2)));
        assert_eq!(ids(&state), vec![1, 3]);
        assert_eq!(state.combinators(), &[Or]);
    }

    #[test]
    fn combinator_on_first_condition_is_ignored() {
        let state = with_conditions(2);
        let after = apply(
            state.clone(),
            Action::UpdateCondition {
                id: ConditionId(1),
                edits: vec![ConditionEdit::Combinator(Or)],
            },
        );
        assert_eq!(after, state);
    }

    #[test]
    fn update_merges_only_listed_fields() {
        let state = with_conditions(1);
        let state = apply(
            state,
            Action::UpdateCondition {
                id: ConditionId(1),
                edits: vec![ConditionEdit::Dataset(DatasetId(4))],
            },
        );
        let c = state.condition(ConditionId(1)).unwrap();
        assert_eq!(c.dataset_id, DatasetId(4));
        assert_eq!(c.kind(), ConditionKind::Threshold);
    }

    #[test]
    fn unknown_ids_and_bad_indices_are_no_ops() {
        let state = with_conditions(2);
        let same = apply(state.clone(), Action::RemoveCondition(ConditionId(99)));
        assert_eq!(same, state);
        let same = apply(state.clone(), Action::MoveCondition { from: 0, to: 5 });
        assert_eq!(same, state);
    }

    #[test]
    fn move_keeps_combinators_in_place() {
        let mut state = with_conditions(3);
        state = apply(
            state,
            Action::UpdateCondition {
                id: ConditionId(3),
                edits: vec![ConditionEdit::Combinator(Or)],
            },
        );
        state = apply(state, Action::MoveCondition { from: 2, to: 0 });
        assert_eq!(ids(&state), vec![3, 1, 2]);
        assert_eq!(state.combinators(), &[And, Or]);
    }

    #[test]
    fn single_mode_submits_only_the_first_condition() {
        let state = with_conditions(2);
        assert_eq!(state.submitted_conditions().len(), 1);
        let state = apply(state, Action::SetMode(StrategyMode::Composite));
        assert_eq!(state.submitted_conditions().len(), 2);
    }

    #[test]
    fn builder_reassembles_on_dispatch() {
        let mut builder = CompositeStrategyBuilder::default();
        assert!(builder.request().is_composite());
        builder.dispatch(Action::AddCondition);
        assert!(!builder.request().is_composite());
    }
}
