//! Wire shapes exchanged with the execution engine.
//!
//! Every omission rule lives here as `skip_serializing_if`: variant keys that
//! do not match `strategy_type` are absent (not `null`), a transform of kind
//! `none` carries no `period`, a disabled price filter is just
//! `{"enabled": false}`, and risk percentages appear only when their `use_`
//! flag is set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::condition::ConditionKind;
use crate::domain::{Comparison, DatasetId, Direction, MaKind, Period, Series};
use crate::evaluation::{render_expression, Combinator};
use crate::fingerprint::RequestHash;
use crate::params::BacktestWindow;
use crate::transform::TransformKind;

// ─── Request pieces ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPayload {
    #[serde(rename = "type")]
    pub kind: TransformKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// Keyed by series code: `v` for the indicator, `usd` for the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPairPayload {
    pub v: TransformPayload,
    pub usd: TransformPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFilterPayload {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma_type: Option<MaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Comparison>,
}

impl PriceFilterPayload {
    pub const DISABLED: PriceFilterPayload = PriceFilterPayload {
        enabled: false,
        ma_type: None,
        ma_period: None,
        condition: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverPayload {
    pub entry_fast_period: Period,
    pub entry_slow_period: Period,
    pub exit_fast_period: Period,
    pub exit_slow_period: Period,
    pub entry_type: MaKind,
    pub exit_type: MaKind,
    pub entry_direction: Direction,
    pub exit_direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiDatasetPayload {
    pub dataset1_id: DatasetId,
    pub dataset1_indicator: Series,
    pub dataset1_ma_type: MaKind,
    pub dataset1_ma_period: Period,
    pub dataset2_id: DatasetId,
    pub dataset2_indicator: Series,
    pub dataset2_ma_type: MaKind,
    pub dataset2_ma_period: Period,
    pub entry_direction: Direction,
    pub exit_direction: Direction,
    pub price_dataset_id: DatasetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<f64>,
    pub use_take_profit: bool,
    pub use_stop_loss: bool,
}

/// One condition in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionPayload {
    pub dataset_id: DatasetId,
    pub transform: TransformPairPayload,
    pub apply_to: Series,
    /// Older composite bodies spell this `type`.
    #[serde(alias = "type")]
    pub strategy_type: ConditionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_entry: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_exit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossover_strategy: Option<CrossoverPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_dataset_crossover_strategy: Option<MultiDatasetPayload>,
    pub bitcoin_price_condition: PriceFilterPayload,
    /// Present on every composite entry except the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonPayload {
    pub period: BacktestWindow,
    pub fees: f64,
    pub slippage: f64,
    pub init_cash: f64,
}

// ─── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleBacktestRequest {
    #[serde(flatten)]
    pub condition: ConditionPayload,
    #[serde(flatten)]
    pub common: CommonPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBacktestRequest {
    pub conditions: Vec<ConditionPayload>,
    #[serde(flatten)]
    pub common: CommonPayload,
}

impl CompositeBacktestRequest {
    /// Combinators joining each entry after the first.
    pub fn combinators(&self) -> Vec<Combinator> {
        self.conditions
            .iter()
            .skip(1)
            .map(|c| c.logic.unwrap_or_default())
            .collect()
    }

    /// The left-fold evaluation order, e.g. `((c1 AND c2) OR c3)`.
    pub fn expression(&self) -> String {
        let labels: Vec<String> = (1..=self.conditions.len()).map(|i| format!("c{i}")).collect();
        render_expression(&labels, &self.combinators())
    }
}

/// The body of `POST /api/backtest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BacktestRequest {
    Composite(CompositeBacktestRequest),
    Single(SingleBacktestRequest),
}

impl BacktestRequest {
    pub fn is_composite(&self) -> bool {
        matches!(self, BacktestRequest::Composite(_))
    }

    pub fn common(&self) -> &CommonPayload {
        match self {
            BacktestRequest::Composite(r) => &r.common,
            BacktestRequest::Single(r) => &r.common,
        }
    }

    pub fn conditions(&self) -> Vec<&ConditionPayload> {
        match self {
            BacktestRequest::Composite(r) => r.conditions.iter().collect(),
            BacktestRequest::Single(r) => vec![&r.condition],
        }
    }

    /// Label stored with saved strategies: the condition kind, or `composite`.
    pub fn strategy_type(&self) -> &'static str {
        match self {
            BacktestRequest::Composite(_) => "composite",
            BacktestRequest::Single(r) => r.condition.strategy_type.as_str(),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn hash(&self) -> RequestHash {
        RequestHash::of(self)
    }
}

// ─── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    #[serde(default)]
    pub total_return: f64,
    #[serde(default)]
    pub sharpe: f64,
    #[serde(default)]
    pub max_drawdown: f64,
    #[serde(default)]
    pub trades: u64,
    /// Engine-specific statistics this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: String,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// `None` when the engine cannot map the trade back to a bar.
    #[serde(default)]
    pub entry_date: Option<String>,
    #[serde(default)]
    pub exit_date: Option<String>,
    pub entry_price: f64,
    pub exit_price: f64,
    #[serde(default)]
    pub size: f64,
    pub pnl: f64,
    pub return_pct: f64,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub entry_fees: f64,
    #[serde(default)]
    pub exit_fees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResponse {
    pub results: BacktestSummary,
    #[serde(default)]
    pub equity: Vec<EquityPoint>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub freq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_interval: Option<String>,
}

// ─── Datasets and saved strategies ───────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /api/strategies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStrategy {
    pub strategy_name: String,
    pub strategy_type: String,
    pub configuration: serde_json::Value,
    pub results: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl NewStrategy {
    pub fn from_run(
        name: impl Into<String>,
        request: &BacktestRequest,
        response: &BacktestResponse,
        comments: Option<String>,
    ) -> Self {
        Self {
            strategy_name: name.into(),
            strategy_type: request.strategy_type().to_string(),
            configuration: request.to_value(),
            results: serde_json::to_value(response).unwrap_or(serde_json::Value::Null),
            comments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedStrategy {
    pub id: u64,
    pub strategy_name: String,
    pub strategy_type: String,
    #[serde(default)]
    pub configuration: serde_json::Value,
    #[serde(default)]
    pub results: serde_json::Value,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub num_trades: Option<u64>,
    #[serde(default)]
    pub net_pnl: Option<f64>,
}
