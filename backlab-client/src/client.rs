//! Blocking HTTP client for the backtest service.
//!
//! One request per call: no retry, no backoff, no idempotency key. Non-2xx
//! responses become [`ClientError::Status`] carrying the raw body text.

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

use backlab_core::contract::{
    BacktestRequest, BacktestResponse, Dataset, NewStrategy, SavedStrategy,
};
use backlab_core::domain::DatasetId;

use crate::config::ApiConfig;
use crate::error::ClientError;

/// The calls a submission needs. Implemented by [`ApiClient`] and by test
/// doubles.
pub trait BacktestBackend: Send + Sync {
    fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResponse, ClientError>;

    fn list_datasets(&self) -> Result<Vec<Dataset>, ClientError>;
}

pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|_| ClientError::InvalidUrl(config.base_url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }
        // reqwest's blocking client defaults to 30s; `None` must be explicit.
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `path` is relative to the base, e.g. `api/datasets`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    pub fn get_dataset(&self, id: DatasetId) -> Result<Dataset, ClientError> {
        let url = self.endpoint(&format!("api/datasets/{id}"));
        read_json(self.client.get(url).send()?)
    }

    pub fn list_strategies(&self) -> Result<Vec<SavedStrategy>, ClientError> {
        read_json(self.client.get(self.endpoint("api/strategies")).send()?)
    }

    pub fn save_strategy(&self, strategy: &NewStrategy) -> Result<serde_json::Value, ClientError> {
        tracing::info!(name = %strategy.strategy_name, "saving strategy");
        let resp = self
            .client
            .post(self.endpoint("api/strategies"))
            .json(strategy)
            .send()?;
        read_json(resp)
    }

    pub fn delete_strategy(&self, id: u64) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("api/strategies/{id}"));
        let resp = self.client.delete(url).send()?;
        check_status(resp).map(|_| ())
    }
}

impl BacktestBackend for ApiClient {
    fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResponse, ClientError> {
        let resp = self
            .client
            .post(self.endpoint("api/backtest"))
            .json(request)
            .send()?;
        read_json(resp)
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>, ClientError> {
        read_json(self.client.get(self.endpoint("api/datasets")).send()?)
    }
}

fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    tracing::debug!(%status, "request failed");
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check_status(resp)?;
    let bytes = resp.bytes()?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> Result<ApiClient, ClientError> {
        ApiClient::new(&ApiConfig {
            base_url: url.into(),
            ..ApiConfig::default()
        })
    }

    #[test]
    fn endpoints_join_without_double_slashes() {
        let c = client("http://localhost:8000/").unwrap();
        assert_eq!(c.endpoint("api/backtest"), "http://localhost:8000/api/backtest");

        let c = client("http://host/prefix").unwrap();
        assert_eq!(c.endpoint("api/datasets"), "http://host/prefix/api/datasets");
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(matches!(client("not a url"), Err(ClientError::InvalidUrl(_))));
        assert!(matches!(client("mailto:x@y"), Err(ClientError::InvalidUrl(_))));
    }
}
