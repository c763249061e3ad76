//! Backlab Client: the HTTP boundary of the strategy builder.
//!
//! - `ApiClient`: blocking calls to the backtest service
//! - `BacktestBackend`: the seam submissions go through
//! - `Submitter`: one request in flight at a time, with opt-in cancellation
//! - `ClientConfig`: TOML file plus `BACKLAB_API_URL`

pub mod client;
pub mod config;
pub mod error;
pub mod submission;

pub use client::{ApiClient, BacktestBackend};
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use error::ClientError;
pub use submission::{SubmissionHandle, SubmissionRecord, SubmitError, Submitter};
