// src/fetch.rs
// Network collaborator for the adapters. The trait keeps adapters testable
// against canned payloads; the reqwest implementation applies the bounded
// timeouts the run model requires.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AggregatorConfig;
use crate::error::AdapterError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("network error: {0}")]
    Unreachable(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

impl From<FetchError> for AdapterError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(secs) => AdapterError::Timeout(secs),
            FetchError::Unreachable(msg) => AdapterError::Unreachable(msg),
            FetchError::Status(code @ (401 | 403)) => {
                AdapterError::Unauthorized(format!("HTTP {code}"))
            }
            FetchError::Status(code) => AdapterError::Unreachable(format!("HTTP {code}")),
        }
    }
}

/// Fetches one URL body as text. Network-vs-status failures stay
/// distinguishable so adapters can map them onto their own taxonomy.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn get_text(&self, url: &str, headers: &[(String, String)])
        -> Result<String, FetchError>;
}

pub struct HttpFetchClient {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetchClient {
    pub fn new(cfg: &AggregatorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            timeout_secs: cfg.fetch_timeout_secs,
        })
    }
}

#[async_trait]
impl FetchClient for HttpFetchClient {
    async fn get_text(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else {
                FetchError::Unreachable(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_secs)
            } else {
                FetchError::Unreachable(e.to_string())
            }
        })
    }
}
