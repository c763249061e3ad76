//! Client configuration.
//!
//! Read from a TOML file with an `[api]` table. A missing file means
//! defaults. `BACKLAB_API_URL` overrides the file's `base_url`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "BACKLAB_API_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// `None` leaves requests without a deadline.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: concat!("backlab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ClientConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`; a file that does not exist yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no client config, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Apply `BACKLAB_API_URL` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }
}
