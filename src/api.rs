use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{ScanRequest, ScanResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure of the remote scan call. `Display` is the message shown in the log panel.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("invalid response from scan API: {0}")]
    Decode(String),
}

/// The remote service that produces a risk report for a request.
#[async_trait]
pub trait ScanApi: Send + Sync {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, ScanError>;
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// `ScanApi` over HTTP: `POST {base_url}/api/scan`.
#[derive(Debug, Clone)]
pub struct HttpScanApi {
    client: Client,
    base_url: String,
}

impl HttpScanApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe `GET /health` and return the reported status.
    pub async fn health(&self) -> Result<String, ScanError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                status: status.as_u16(),
                detail: format!("API error: {}", status.as_u16()),
            });
        }
        let body: HealthBody = resp
            .json()
            .await
            .map_err(|e| ScanError::Decode(e.to_string()))?;
        Ok(body.status)
    }
}

#[async_trait]
impl ScanApi for HttpScanApi {
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, ScanError> {
        let url = self.url("/api/scan");
        debug!(%url, "sending scan request");
        let resp = self
            .client
            .post(&url)
            .json(&request.normalized())
            .send()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = error_detail(status, &body);
            warn!(status = status.as_u16(), %detail, "scan API returned an error");
            return Err(ScanError::Status { status: status.as_u16(), detail });
        }

        serde_json::from_slice(&body).map_err(|e| ScanError::Decode(e.to_string()))
    }
}

/// Pull `detail` out of an error body. Unparseable bodies read as "Unknown error".
fn error_detail(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { detail: Some(d) }) if !d.is_empty() => d,
        Ok(_) => format!("API error: {}", status.as_u16()),
        Err(_) => "Unknown error".to_string(),
    }
}
