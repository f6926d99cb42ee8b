//! Error types for the scheduler module

use std::fmt;

use crate::models::RotationSettings;
use crate::storage::StorageError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Result type for selector operations
pub type SelectorResult<T> = Result<T, SelectorError>;

// ============================================================================
// Selector Errors
// ============================================================================

/// Errors from drawing a wallpaper
#[derive(Debug)]
pub enum SelectorError {
    /// The cache holds no records to draw from
    NoRecords,

    /// The selection could not be persisted or read back
    Storage(StorageError),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecords => write!(f, "No records available; bootstrap the cache first"),
            Self::Storage(e) => write!(f, "Selection storage error: {}", e),
        }
    }
}

impl std::error::Error for SelectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::NoRecords => None,
        }
    }
}

impl From<StorageError> for SelectorError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl SelectorError {
    /// Check if the error is recoverable
    ///
    /// An empty cache clears once the cache is bootstrapped.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoRecords)
    }
}

// ============================================================================
// Scheduler Errors
// ============================================================================

/// Rotation scheduler errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Interval below the supported minimum
    InvalidInterval { minutes: u32 },

    /// Settings could not be persisted or read back
    Storage(StorageError),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInterval { minutes } => {
                write!(
                    f,
                    "Invalid rotation interval '{}' minutes. Must be at least {}",
                    minutes,
                    RotationSettings::MIN_INTERVAL_MINUTES
                )
            }
            Self::Storage(e) => write!(f, "Rotation settings storage error: {}", e),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::InvalidInterval { .. } => None,
        }
    }
}

impl From<StorageError> for SchedulerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl SchedulerError {
    /// Create an invalid interval error
    pub fn invalid_interval(minutes: u32) -> Self {
        Self::InvalidInterval { minutes }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_interval_error() {
        let err = SchedulerError::invalid_interval(4);
        assert!(err.to_string().contains('4'));
        assert!(err.to_string().contains("at least 5"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_no_records_is_recoverable() {
        assert!(SelectorError::NoRecords.is_recoverable());
    }

    #[test]
    fn test_from_storage_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let storage_err = StorageError::Json {
            key: "currentIndex".to_string(),
            source: json_err,
        };
        let err: SelectorError = storage_err.into();
        assert!(matches!(err, SelectorError::Storage(_)));
        assert!(!err.is_recoverable());
    }
}
