//! Backlab Core: the strategy-composition model.
//!
//! Turns user-entered trading conditions into the request consumed by an
//! external backtest engine:
//! - Domain vocabulary (datasets, periods, series, directions)
//! - Transforms and the three condition kinds, with sticky variant switching
//! - The builder reducer (`apply(state, action) -> state`)
//! - The assembler and the wire contract it produces
//! - Submit readiness, strictness lints and request fingerprints
//!
//! Nothing here performs I/O apart from reading draft files; indicator math
//! and trade simulation belong to the engine.

pub mod assembler;
pub mod builder;
pub mod coerce;
pub mod condition;
pub mod contract;
pub mod domain;
pub mod draft;
pub mod evaluation;
pub mod fingerprint;
pub mod params;
pub mod readiness;
pub mod transform;

pub use assembler::assemble;
pub use builder::{apply, Action, BuilderState, CompositeStrategyBuilder, StrategyMode};
pub use coerce::TextField;
pub use condition::{Condition, ConditionEdit, ConditionKind, StrategyVariant};
pub use contract::{BacktestRequest, BacktestResponse};
pub use domain::{ConditionId, DatasetId, Period};
pub use draft::{DraftError, StrategyDraft};
pub use evaluation::{evaluate, render_expression, Combinator};
pub use fingerprint::RequestHash;
pub use params::{BacktestWindow, CommonParams};
pub use readiness::{Incomplete, Lint, Strictness, SubmitGate};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: state and wire types can cross to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<BuilderState>();
        require_sync::<BuilderState>();
        require_send::<CompositeStrategyBuilder>();
        require_sync::<CompositeStrategyBuilder>();
        require_send::<BacktestRequest>();
        require_sync::<BacktestRequest>();
        require_send::<BacktestResponse>();
        require_sync::<BacktestResponse>();
        require_send::<RequestHash>();
        require_sync::<RequestHash>();
        require_send::<DraftError>();
        require_sync::<DraftError>();
    }
}
