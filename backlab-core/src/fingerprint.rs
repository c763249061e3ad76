//! Request fingerprinting.
//!
//! A `RequestHash` is the BLAKE3 digest of the request's canonical JSON.
//! Going through `serde_json::Value` sorts object keys, so two structurally
//! identical requests hash equal regardless of field declaration order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::BacktestRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHash(pub String);

impl RequestHash {
    pub fn of(request: &BacktestRequest) -> Self {
        let canonical = request.to_value();
        let hash_bytes = blake3::hash(canonical.to_string().as_bytes());
        Self(hash_bytes.to_hex().to_string())
    }

    /// First 12 hex characters, for log lines and tables.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
