use thiserror::Error;

/// Failures talking to the backtest service.
///
/// Payloads are plain strings so errors can cross the submission channel and
/// be shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid API url '{0}'")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
