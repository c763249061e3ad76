//! Single-in-flight backtest submission.
//!
//! [`Submitter::submit`] checks the builder's gate, claims the running slot
//! and runs the backend call on a named worker thread; the result comes back
//! over an `mpsc` channel held by the [`SubmissionHandle`]. A second submit
//! while one is outstanding is refused. The slot is advisory: nothing is sent
//! to the server to deduplicate requests.
//!
//! Cancelling does not abort the HTTP call. It frees the slot immediately and
//! the worker drops the result when it arrives.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use backlab_core::builder::CompositeStrategyBuilder;
use backlab_core::contract::{BacktestRequest, BacktestResponse};
use backlab_core::fingerprint::RequestHash;
use backlab_core::readiness::{Incomplete, Lint};

use crate::client::BacktestBackend;
use crate::error::ClientError;

const IDLE: u64 = 0;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("strategy is not ready to submit ({} missing, {} blocking lints)", .missing.len(), .lints.len())]
    NotReady {
        missing: Vec<Incomplete>,
        lints: Vec<Lint>,
    },

    #[error("a backtest is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Backend(#[from] ClientError),

    #[error("submission was cancelled")]
    Cancelled,

    #[error("failed to spawn submission worker: {0}")]
    Spawn(String),
}

/// A finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub hash: RequestHash,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub response: BacktestResponse,
}

impl SubmissionRecord {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.submitted_at).num_milliseconds()
    }
}

type Outcome = Result<BacktestResponse, ClientError>;

pub struct Submitter<B> {
    backend: Arc<B>,
    /// Ticket of the submission holding the slot, `IDLE` when free.
    running: Arc<AtomicU64>,
    next_ticket: AtomicU64,
}

impl<B: BacktestBackend + 'static> Submitter<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            running: Arc::new(AtomicU64::new(IDLE)),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) != IDLE
    }

    /// Gate, claim the slot and start the request in the background.
    pub fn submit(
        &self,
        builder: &CompositeStrategyBuilder,
    ) -> Result<SubmissionHandle, SubmitError> {
        let gate = builder.gate();
        if !gate.can_submit() {
            let lints = if gate.blocked_by_lints {
                gate.warnings
            } else {
                Vec::new()
            };
            return Err(SubmitError::NotReady {
                missing: gate.missing,
                lints,
            });
        }
        for warning in &gate.warnings {
            tracing::warn!(%warning, "submitting with lint");
        }
        self.submit_request(builder.request().clone())
    }

    /// Start an already assembled request. Skips the gate.
    pub fn submit_request(&self, request: BacktestRequest) -> Result<SubmissionHandle, SubmitError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if self
            .running
            .compare_exchange(IDLE, ticket, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::AlreadyRunning);
        }

        let hash = request.hash();
        let submitted_at = Utc::now();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<Outcome>();

        tracing::info!(hash = hash.short(), composite = request.is_composite(), "backtest submitted");

        let backend = Arc::clone(&self.backend);
        let running = Arc::clone(&self.running);
        let worker_cancelled = Arc::clone(&cancelled);
        let worker_hash = hash.clone();
        let spawned = thread::Builder::new()
            .name("backlab-submit".into())
            .spawn(move || {
                let outcome = backend.run_backtest(&request);
                release(&running, ticket);
                if worker_cancelled.load(Ordering::Acquire) {
                    tracing::warn!(hash = worker_hash.short(), "result of cancelled backtest discarded");
                    return;
                }
                // The handle may already be gone; nothing to report then.
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            release(&self.running, ticket);
            return Err(SubmitError::Spawn(e.to_string()));
        }

        Ok(SubmissionHandle {
            ticket,
            hash,
            submitted_at,
            rx,
            cancelled,
            running: Arc::clone(&self.running),
        })
    }
}

fn release(running: &AtomicU64, ticket: u64) {
    let _ = running.compare_exchange(ticket, IDLE, Ordering::AcqRel, Ordering::Acquire);
}

/// The caller's side of one submission.
pub struct SubmissionHandle {
    ticket: u64,
    hash: RequestHash,
    submitted_at: DateTime<Utc>,
    rx: Receiver<Outcome>,
    cancelled: Arc<AtomicBool>,
    running: Arc<AtomicU64>,
}

impl SubmissionHandle {
    pub fn hash(&self) -> &RequestHash {
        &self.hash
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Block until the backend answers.
    pub fn wait(self) -> Result<SubmissionRecord, SubmitError> {
        match self.rx.recv() {
            Ok(outcome) => self.finish(outcome),
            Err(_) => Err(SubmitError::Cancelled),
        }
    }

    /// Poll without blocking: `None` while the request is still in flight.
    pub fn try_wait(&self) -> Option<Result<SubmissionRecord, SubmitError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SubmitError::Cancelled)),
        }
    }

    /// Stop waiting. The request keeps running server-side; its result is
    /// discarded and the submitter is free immediately.
    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::Release);
        release(&self.running, self.ticket);
        tracing::info!(hash = self.hash.short(), "backtest cancelled");
    }

    fn finish(&self, outcome: Outcome) -> Result<SubmissionRecord, SubmitError> {
        match outcome {
            Ok(response) => {
                let record = SubmissionRecord {
                    hash: self.hash.clone(),
                    submitted_at: self.submitted_at,
                    finished_at: Utc::now(),
                    response,
                };
                tracing::info!(
                    hash = self.hash.short(),
                    trades = record.response.results.trades,
                    elapsed_ms = record.elapsed_ms(),
                    "backtest finished"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(hash = self.hash.short(), error = %e, "backtest failed");
                Err(SubmitError::Backend(e))
            }
        }
    }
}
