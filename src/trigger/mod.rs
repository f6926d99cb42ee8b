//! Local HTTP trigger for the external scraper
//!
//! A small axum server that launches the configured scraper program as a
//! subprocess and reports how many records it wrote. The scraper itself is a
//! black box: it receives the requested keywords as arguments and writes a
//! JSON array to a known file.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  POST /api/scrape  ┌───────────────┐  spawn   ┌──────────┐
//! │ TriggerClient│───────────────────►│ TriggerServer │─────────►│ scraper  │
//! └──────────────┘  {keywords: [..]}  │ ScrapeRunner  │◄─────────│ process  │
//!                                     └───────┬───────┘  exit    └────┬─────┘
//!                                             │ count entries         │ writes
//!                                             ▼                       ▼
//!                                       {success, count}        output.json
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pinwall::trigger::{TriggerConfig, TriggerServer};
//!
//! let config = TriggerConfig::builder()
//!     .scraper_program("python3")
//!     .scraper_args(vec!["pinterest_scraper.py".to_string()])
//!     .build()?;
//! let server = TriggerServer::new(config)?;
//! server.start_with_shutdown(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod runner;
pub mod server;

use std::path::PathBuf;
use std::time::Duration;

// Re-export main types
pub use api::{ScrapeRequest, ScrapeResponse};
pub use client::{ClientConfig, TriggerClient};
pub use config::{ConfigError, TriggerConfig};
pub use runner::ScrapeRunner;
pub use server::{ServerError, TriggerServer};

/// Result type for trigger operations
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Errors from launching the scraper or talking to the trigger server
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// Request body was unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Another scrape is still running
    #[error("A scrape is already in progress")]
    Busy,

    /// The scraper program could not be started
    #[error("Failed to start scraper '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The scraper ran past its time budget and was killed
    #[error("Scraper timed out after {0:?}")]
    Timeout(Duration),

    /// The scraper exited unsuccessfully
    #[error("Scraper exited with {}: {stderr}", .status.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    ScraperFailed { status: Option<i32>, stderr: String },

    /// The scraper's output file was missing or malformed
    #[error("Bad scraper output at {}: {reason}", .path.display())]
    Output { path: PathBuf, reason: String },

    /// HTTP transport failure on the client side
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a failure
    #[error("Trigger server reported failure ({status}): {message}")]
    Server { status: u16, message: String },
}

impl TriggerError {
    /// Whether trying the same scrape again later may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Busy | Self::Timeout(_) | Self::Http(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::InvalidRequest(_) | Self::Spawn { .. } | Self::ScraperFailed { .. } | Self::Output { .. } => false,
        }
    }

    /// HTTP status the trigger server answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Busy => 409,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }
}
