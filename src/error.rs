//! Unified error handling for the pinwall crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`PinwallErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use pinwall::error::{Error, PinwallErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = ?err.category(), "Retrying: {err}");
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::cache::CacheError;
pub use crate::favorites::FavoritesError;
pub use crate::normalizer::NormalizeError;
pub use crate::scheduler::error::{SchedulerError, SelectorError};
pub use crate::storage::StorageError;
pub use crate::trigger::TriggerError;

/// Common trait for pinwall error types
pub trait PinwallErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried or will clear by itself)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bootstrap data and record normalization
    Data,
    /// Persistence and I/O
    Storage,
    /// Selection and rotation
    Scheduler,
    /// Scrape trigger, subprocess and HTTP
    Trigger,
    /// Configuration and validation
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Storage => "storage",
            Self::Scheduler => "scheduler",
            Self::Trigger => "trigger",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for the pinwall crate
#[derive(Error, Debug)]
pub enum Error {
    /// Record normalization errors
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Selection errors
    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    /// Rotation scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Favorites errors
    #[error("Favorites error: {0}")]
    Favorites(#[from] FavoritesError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Scrape trigger errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Command dispatcher is no longer running
    #[error("Command dispatcher unavailable")]
    DispatcherClosed,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PinwallErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Normalize(_) => true, // dropped entry, batch continues
            Self::Cache(e) => matches!(e, CacheError::Storage(_) | CacheError::Read { .. }),
            Self::Selector(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Favorites(e) => matches!(e, FavoritesError::Storage(_)),
            Self::Storage(e) => matches!(e, StorageError::Io { .. }),
            Self::Trigger(e) => e.is_recoverable(),
            Self::DispatcherClosed => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Normalize(_) | Self::Json(_) => ErrorCategory::Data,
            Self::Cache(e) => match e {
                CacheError::Storage(_) | CacheError::Read { .. } => ErrorCategory::Storage,
                _ => ErrorCategory::Data,
            },
            Self::Selector(_) | Self::Scheduler(_) | Self::DispatcherClosed => ErrorCategory::Scheduler,
            Self::Favorites(_) | Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Trigger(_) => ErrorCategory::Trigger,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
