//! Best-effort theme side channel
//!
//! A [`ThemeSource`] derives an accent color from a record. Sampling can fail
//! for reasons outside the crate's control (cross-origin media, decode
//! errors), so [`ThemePublisher`] swallows every failure: selection and
//! rotation never depend on it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{Event, EventBus};
use crate::models::Record;

/// Result type for theme sampling
pub type ThemeResult<T> = Result<T, ThemeError>;

/// Errors from a theme source
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// The source could not read the media
    #[error("Media unavailable for sampling: {0}")]
    Unavailable(String),

    /// Sampling did not finish in time
    #[error("Theme sampling timed out after {0:?}")]
    Timeout(Duration),

    /// Sampled value is not a usable color
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
}

/// Capability that samples an accent color for a record
#[async_trait]
pub trait ThemeSource: Send + Sync {
    fn name(&self) -> &str;

    async fn sample(&self, record: &Record) -> ThemeResult<String>;
}

/// Source that always yields the same color
#[derive(Debug, Clone)]
pub struct StaticTheme {
    color: String,
}

impl StaticTheme {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

#[async_trait]
impl ThemeSource for StaticTheme {
    fn name(&self) -> &str {
        "static"
    }

    async fn sample(&self, _record: &Record) -> ThemeResult<String> {
        Ok(self.color.clone())
    }
}

/// Publishes `ThemeUpdated` events, ignoring sampling failures
#[derive(Clone)]
pub struct ThemePublisher {
    source: Arc<dyn ThemeSource>,
    bus: EventBus,
    timeout: Duration,
}

impl ThemePublisher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(source: Arc<dyn ThemeSource>, bus: EventBus) -> Self {
        Self {
            source,
            bus,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish a color supplied by a rendering surface
    ///
    /// Blank colors are dropped. Returns whether an event was published.
    pub fn publish_color(&self, color: &str) -> bool {
        let color = color.trim();
        if color.is_empty() {
            tracing::debug!("Ignoring blank theme color");
            return false;
        }
        self.bus.publish(Event::ThemeUpdated {
            color: color.to_string(),
        });
        true
    }

    /// Sample the source for `record` and publish the result
    pub async fn publish_for(&self, record: &Record) -> Option<String> {
        let sampled = match tokio::time::timeout(self.timeout, self.source.sample(record)).await {
            Ok(result) => result,
            Err(_) => Err(ThemeError::Timeout(self.timeout)),
        };

        match sampled {
            Ok(color) if self.publish_color(&color) => Some(color.trim().to_string()),
            Ok(color) => {
                tracing::debug!(error = %ThemeError::InvalidColor(color), "Theme sample discarded");
                None
            }
            Err(e) => {
                tracing::debug!(source = self.source.name(), url = %record.url, error = %e, "Theme sampling failed");
                None
            }
        }
    }

    /// Follow the bus and sample a color for every new wallpaper
    pub fn spawn(self) -> JoinHandle<()> {
        let mut events = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(Event::WallpaperChanged(record)) => {
                        self.publish_for(&record).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Theme publisher lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
