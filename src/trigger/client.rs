//! Client for the scrape trigger server

use std::time::Duration;

use reqwest::Client;

use super::api::{ApiResponse, HealthResponse, ScrapeRequest, ScrapeResponse};
use super::{TriggerError, TriggerResult};

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the trigger client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Trigger server base URL
    pub server_url: String,

    /// Request timeout, covering the whole scrape
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(660),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Trigger Client
// ============================================================================

/// HTTP client for `POST /api/scrape` and `GET /api/health`
pub struct TriggerClient {
    config: ClientConfig,
    http_client: Client,
}

impl TriggerClient {
    /// Create a new trigger client
    pub fn new(config: ClientConfig) -> TriggerResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("pinwall/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Request a scrape and return the number of records written
    pub async fn scrape(&self, keywords: &[String]) -> TriggerResult<usize> {
        let url = format!("{}/api/scrape", self.config.server_url);
        let request = ScrapeRequest {
            keywords: keywords.to_vec(),
        };

        let response = self.http_client.post(&url).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ScrapeResponse>(&text) {
            Ok(body) if body.success => Ok(body.count.unwrap_or(0)),
            Ok(body) => Err(TriggerError::Server {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            Err(_) => Err(TriggerError::Server {
                status: status.as_u16(),
                message: text,
            }),
        }
    }

    /// Check trigger server health
    pub async fn health(&self) -> TriggerResult<HealthStatus> {
        let url = format!("{}/api/health", self.config.server_url);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Server {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: ApiResponse<HealthResponse> = response.json().await?;
        match body.data {
            Some(health) => Ok(HealthStatus {
                healthy: health.status == "healthy",
                version: health.version,
                uptime_secs: health.uptime_secs,
            }),
            None => Err(TriggerError::Server {
                status: status.as_u16(),
                message: "Missing health data".to_string(),
            }),
        }
    }
}

/// Health status from the trigger server
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub version: String,
    pub uptime_secs: u64,
}

// ============================================================================
// Tests
// ============================================================================
