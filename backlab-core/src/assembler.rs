//! Folds builder state into the canonical request.
//!
//! [`assemble`] is total and pure: it never fails, never mutates its input
//! and returns structurally identical output for identical input. Incomplete
//! conditions (no dataset selected, and so on) pass through as-is; gating
//! them is the job of [`crate::readiness`].

use crate::builder::{BuilderState, StrategyMode};
use crate::condition::{
    AuxiliaryPriceFilter, Condition, MultiDatasetCrossoverCondition, SingleCrossoverCondition,
    StrategyVariant,
};
use crate::contract::{
    BacktestRequest, CommonPayload, CompositeBacktestRequest, ConditionPayload, CrossoverPayload,
    MultiDatasetPayload, PriceFilterPayload, SingleBacktestRequest, TransformPairPayload,
    TransformPayload,
};
use crate::evaluation::Combinator;
use crate::params::CommonParams;
use crate::transform::TransformConfig;

pub fn assemble(state: &BuilderState) -> BacktestRequest {
    let common = common_payload(state.params());
    let request = match (state.mode(), state.conditions().first()) {
        (StrategyMode::Single, Some(first)) => BacktestRequest::Single(SingleBacktestRequest {
            condition: condition_payload(first, None),
            common,
        }),
        // Single mode with nothing to submit degrades to an empty chain.
        (StrategyMode::Single, None) | (StrategyMode::Composite, _) => {
            let conditions = state
                .links()
                .map(|(condition, op)| condition_payload(condition, op))
                .collect();
            BacktestRequest::Composite(CompositeBacktestRequest { conditions, common })
        }
    };
    tracing::trace!(
        mode = %state.mode(),
        conditions = state.submitted_conditions().len(),
        "request assembled"
    );
    request
}

fn common_payload(params: &CommonParams) -> CommonPayload {
    CommonPayload {
        period: params.window,
        fees: params.fee_rate(),
        slippage: params.slippage_rate(),
        init_cash: params.initial_capital(),
    }
}

fn condition_payload(condition: &Condition, logic: Option<Combinator>) -> ConditionPayload {
    let mut payload = ConditionPayload {
        dataset_id: condition.dataset_id,
        transform: TransformPairPayload {
            v: transform_payload(&condition.transforms.indicator),
            usd: transform_payload(&condition.transforms.price),
        },
        apply_to: condition.applied_series,
        strategy_type: condition.kind(),
        threshold_entry: None,
        threshold_exit: None,
        crossover_strategy: None,
        multi_dataset_crossover_strategy: None,
        bitcoin_price_condition: price_filter_payload(&condition.price_filter),
        logic,
    };
    match condition.variant() {
        StrategyVariant::Threshold(t) => {
            payload.threshold_entry = Some(t.entry);
            payload.threshold_exit = Some(t.exit);
        }
        StrategyVariant::Crossover(c) => payload.crossover_strategy = Some(crossover_payload(c)),
        StrategyVariant::MultiDatasetCrossover(m) => {
            payload.multi_dataset_crossover_strategy = Some(multi_dataset_payload(m))
        }
    }
    payload
}

fn transform_payload(config: &TransformConfig) -> TransformPayload {
    TransformPayload {
        kind: config.kind(),
        period: config.effective_period(),
    }
}

fn price_filter_payload(filter: &AuxiliaryPriceFilter) -> PriceFilterPayload {
    if !filter.enabled {
        return PriceFilterPayload::DISABLED;
    }
    PriceFilterPayload {
        enabled: true,
        ma_type: Some(filter.ma_kind),
        ma_period: Some(filter.period),
        condition: Some(filter.comparison),
    }
}

fn crossover_payload(c: &SingleCrossoverCondition) -> CrossoverPayload {
    CrossoverPayload {
        entry_fast_period: c.entry.fast_period,
        entry_slow_period: c.entry.slow_period,
        exit_fast_period: c.exit.fast_period,
        exit_slow_period: c.exit.slow_period,
        entry_type: c.entry.ma_kind,
        exit_type: c.exit.ma_kind,
        entry_direction: c.entry.direction,
        exit_direction: c.exit.direction,
    }
}

fn multi_dataset_payload(m: &MultiDatasetCrossoverCondition) -> MultiDatasetPayload {
    MultiDatasetPayload {
        dataset1_id: m.dataset_a.dataset_id,
        dataset1_indicator: m.dataset_a.series,
        dataset1_ma_type: m.dataset_a.ma_kind,
        dataset1_ma_period: m.dataset_a.period,
        dataset2_id: m.dataset_b.dataset_id,
        dataset2_indicator: m.dataset_b.series,
        dataset2_ma_type: m.dataset_b.ma_kind,
        dataset2_ma_period: m.dataset_b.period,
        entry_direction: m.entry_direction,
        exit_direction: m.exit_direction,
        price_dataset_id: m.price_dataset_id,
        take_profit_pct: m.take_profit.active_pct(),
        stop_loss_pct: m.stop_loss.active_pct(),
        use_take_profit: m.take_profit.enabled,
        use_stop_loss: m.stop_loss.enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{apply, Action};
    use crate::condition::{ConditionEdit, ConditionKind, PriceFilterEdit};
    use crate::domain::{DatasetId, Period};
    use crate::transform::{TransformEdit, TransformKind};
    use serde_json::json;

    fn one_condition(edits: Vec<ConditionEdit>) -> BuilderState {
        let state = apply(BuilderState::default(), Action::AddCondition);
        let id = state.last_id().unwrap();
        apply(state, Action::UpdateCondition { id, edits })
    }

    fn value(state: &BuilderState) -> serde_json::Value {
        serde_json::to_value(assemble(state)).unwrap()
    }

    #[test]
    fn default_single_condition_shape() {
        let v = value(&one_condition(vec![]));
        assert_eq!(v["dataset_id"], json!(0));
        assert_eq!(v["strategy_type"], json!("threshold"));
        assert_eq!(v["apply_to"], json!("v"));
        assert_eq!(v["transform"], json!({ "v": { "type": "none" }, "usd": { "type": "none" } }));
        assert_eq!(v["bitcoin_price_condition"], json!({ "enabled": false }));
        assert_eq!(v["period"], json!("all"));
        assert_eq!(v["init_cash"], json!(10000.0));
        assert!(v.get("logic").is_none());
        assert!(v.get("conditions").is_none());
    }

    #[test]
    fn crossover_emits_only_its_own_block() {
        let v = value(&one_condition(vec![ConditionEdit::Kind(ConditionKind::Crossover)]));
        assert!(v.get("threshold_entry").is_none());
        assert!(v.get("multi_dataset_crossover_strategy").is_none());
        assert_eq!(
            v["crossover_strategy"],
            json!({
                "entry_fast_period": 7,
                "entry_slow_period": 30,
                "exit_fast_period": 7,
                "exit_slow_period": 14,
                "entry_type": "sma",
                "exit_type": "sma",
                "entry_direction": "up",
                "exit_direction": "down"
            })
        );
    }

    #[test]
    fn active_transform_emits_period() {
        let v = value(&one_condition(vec![
            ConditionEdit::PriceTransform(TransformEdit::Kind(TransformKind::Ema)),
            ConditionEdit::PriceTransform(TransformEdit::Period(Period::new(9).unwrap())),
        ]));
        assert_eq!(v["transform"]["usd"], json!({ "type": "ema", "period": 9 }));
    }

    #[test]
    fn enabled_price_filter_is_complete() {
        let v = value(&one_condition(vec![ConditionEdit::PriceFilter(
            PriceFilterEdit::Enabled(true),
        )]));
        assert_eq!(
            v["bitcoin_price_condition"],
            json!({ "enabled": true, "ma_type": "sma", "ma_period": 200, "condition": "above" })
        );
    }

    #[test]
    fn composite_carries_logic_on_non_first_entries() {
        let mut state = BuilderState::default();
        for _ in 0..2 {
            state = apply(state, Action::AddCondition);
        }
        state = apply(state, Action::SetMode(StrategyMode::Composite));
        let id = state.last_id().unwrap();
        state = apply(
            state,
            Action::UpdateCondition {
                id,
                edits: vec![ConditionEdit::Dataset(DatasetId(2))],
            },
        );
        let v = value(&state);
        let conditions = v["conditions"].as_array().unwrap();
        assert_eq!(conditions.len(), 2);
        assert!(conditions[0].get("logic").is_none());
        assert_eq!(conditions[1]["logic"], json!("AND"));
        assert_eq!(conditions[1]["dataset_id"], json!(2));
        assert_eq!(v["fees"], json!(0.0005));
        assert!(conditions[0].get("fees").is_none());
    }

    #[test]
    fn assembly_does_not_touch_state() {
        let state = one_condition(vec![ConditionEdit::ThresholdEntry(3.0)]);
        let before = state.clone();
        let _ = assemble(&state);
        assert_eq!(state, before);
    }
}
