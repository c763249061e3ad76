//! Submitter behaviour against an in-process backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use backlab_client::{BacktestBackend, ClientError, SubmitError, Submitter};
use backlab_core::builder::{Action, CompositeStrategyBuilder};
use backlab_core::condition::ConditionEdit;
use backlab_core::contract::{BacktestRequest, BacktestResponse, Dataset};
use backlab_core::domain::DatasetId;
use backlab_core::readiness::{Incomplete, Strictness};
use serde_json::json;

// ── Test doubles ─────────────────────────────────────────────────────

/// Answers every call with `outcome`, optionally waiting for a release
/// signal first so tests can observe the in-flight state.
struct MockBackend {
    outcome: Result<BacktestResponse, ClientError>,
    release: Option<Mutex<Receiver<()>>>,
    calls: AtomicUsize,
}

impl MockBackend {
    fn ok() -> Self {
        Self {
            outcome: Ok(sample_response()),
            release: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(error: ClientError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::ok()
        }
    }

    fn gated() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let backend = Self {
            release: Some(Mutex::new(rx)),
            ..Self::ok()
        };
        (backend, tx)
    }
}

impl BacktestBackend for MockBackend {
    fn run_backtest(&self, _request: &BacktestRequest) -> Result<BacktestResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            let _ = release.lock().unwrap().recv_timeout(Duration::from_secs(5));
        }
        self.outcome.clone()
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>, ClientError> {
        Ok(Vec::new())
    }
}

fn sample_response() -> BacktestResponse {
    serde_json::from_value(json!({
        "results": { "total_return": 0.05, "sharpe": 1.1, "max_drawdown": -0.02, "trades": 2 },
        "equity": [],
        "trades": [],
        "freq": "1D"
    }))
    .unwrap()
}

fn ready_builder() -> CompositeStrategyBuilder {
    let mut builder = CompositeStrategyBuilder::default();
    builder.dispatch(Action::AddCondition);
    let id = builder.state().last_id().unwrap();
    builder.dispatch(Action::UpdateCondition {
        id,
        edits: vec![
            ConditionEdit::Dataset(DatasetId(1)),
            ConditionEdit::ThresholdEntry(10.0),
            ConditionEdit::ThresholdExit(5.0),
        ],
    });
    builder
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn incomplete_strategy_is_refused() {
    let submitter = Submitter::new(MockBackend::ok());
    let mut builder = CompositeStrategyBuilder::default();
    builder.dispatch(Action::AddCondition);

    match submitter.submit(&builder) {
        Err(SubmitError::NotReady { missing, lints }) => {
            assert!(matches!(missing[..], [Incomplete::MissingDataset { .. }]));
            assert!(lints.is_empty());
        }
        other => panic!("expected NotReady, got {:?}", other.err()),
    }
    assert!(!submitter.is_running());
    assert_eq!(submitter.backend().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn successful_run_produces_a_record() {
    let submitter = Submitter::new(MockBackend::ok());
    let builder = ready_builder();

    let handle = submitter.submit(&builder).unwrap();
    assert_eq!(handle.hash(), &builder.request().hash());

    let record = handle.wait().unwrap();
    assert_eq!(record.response.results.trades, 2);
    assert!(record.finished_at >= record.submitted_at);
    assert!(!submitter.is_running());
}

#[test]
fn second_submit_while_running_is_refused() {
    let (backend, release) = MockBackend::gated();
    let submitter = Submitter::new(backend);
    let builder = ready_builder();

    let first = submitter.submit(&builder).unwrap();
    assert!(submitter.is_running());
    assert!(matches!(
        submitter.submit(&builder),
        Err(SubmitError::AlreadyRunning)
    ));

    release.send(()).unwrap();
    first.wait().unwrap();
    assert!(!submitter.is_running());

    release.send(()).unwrap();
    submitter.submit(&builder).unwrap().wait().unwrap();
    assert_eq!(submitter.backend().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn backend_failure_surfaces_raw_text() {
    let submitter = Submitter::new(MockBackend::failing(ClientError::Status {
        status: 500,
        body: "engine exploded".into(),
    }));

    let err = submitter.submit(&ready_builder()).unwrap().wait().unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: engine exploded");
    assert!(!submitter.is_running());
}

#[test]
fn cancel_frees_the_slot_and_discards_the_result() {
    let (backend, release) = MockBackend::gated();
    let submitter = Submitter::new(backend);
    let builder = ready_builder();

    let handle = submitter.submit(&builder).unwrap();
    handle.cancel();
    assert!(!submitter.is_running());

    // A new submission may start while the cancelled call is still pending.
    let next = submitter.submit(&builder).unwrap();
    release.send(()).unwrap();
    release.send(()).unwrap();
    assert!(next.wait().is_ok());
}

#[test]
fn try_wait_reports_in_flight_then_done() {
    let (backend, release) = MockBackend::gated();
    let submitter = Submitter::new(backend);

    let handle = submitter.submit(&ready_builder()).unwrap();
    assert!(handle.try_wait().is_none());

    release.send(()).unwrap();
    let outcome = loop {
        if let Some(outcome) = handle.try_wait() {
            break outcome;
        }
        std::thread::sleep(Duration::from_millis(5));
    };
    assert!(outcome.is_ok());
}

#[test]
fn strict_lints_block_submission() {
    let submitter = Submitter::new(MockBackend::ok());
    let mut builder = ready_builder();
    let id = builder.state().last_id().unwrap();
    builder.dispatch(Action::UpdateCondition {
        id,
        edits: vec![ConditionEdit::ThresholdExit(10.0)],
    });
    builder.set_strictness(Strictness::Strict);

    match submitter.submit(&builder) {
        Err(SubmitError::NotReady { missing, lints }) => {
            assert!(missing.is_empty());
            assert_eq!(lints.len(), 1);
        }
        other => panic!("expected NotReady, got {:?}", other.err()),
    }
}
