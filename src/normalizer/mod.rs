//! Record normalization
//!
//! Turns the entries of a bootstrap document into canonical [`Record`]s.
//! Two input shapes exist in the wild:
//!
//! - legacy `{ media, title?, url? }` where `media` is the resource and `url`
//!   is the page it came from
//! - canonical `{ url, type?, title?, source? }`
//!
//! Each entry is classified into a [`RawRecord`] first, so the loose union of
//! both shapes never reaches the rest of the crate.

pub mod url;

use serde_json::{Map, Value};

use crate::models::{MediaKind, Record, DEFAULT_SOURCE, DEFAULT_TITLE};

pub use self::url::{upgrade_to_original, Quality, Rejection, UrlValidator};

/// Per-entry normalization failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Entry names neither `media` nor `url`
    #[error("Entry {position} has no media resource")]
    MissingResource { position: usize },
}

/// Raw entry after shape classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecord {
    Legacy {
        media: String,
        title: Option<String>,
        page_url: Option<String>,
    },
    Canonical {
        url: String,
        kind: Option<String>,
        title: Option<String>,
        source: Option<String>,
    },
}

impl RawRecord {
    /// Classify one JSON entry
    ///
    /// A non-empty string `media` marks the legacy shape; otherwise a
    /// non-empty string `url` marks the canonical shape.
    pub fn classify(value: &Value, position: usize) -> Result<Self, NormalizeError> {
        let missing = NormalizeError::MissingResource { position };
        let obj = value.as_object().ok_or(missing.clone())?;

        if let Some(media) = text_field(obj, "media") {
            return Ok(Self::Legacy {
                media,
                title: text_field(obj, "title"),
                page_url: text_field(obj, "url"),
            });
        }

        if let Some(url) = text_field(obj, "url") {
            return Ok(Self::Canonical {
                url,
                kind: text_field(obj, "type"),
                title: text_field(obj, "title"),
                source: text_field(obj, "source"),
            });
        }

        Err(missing)
    }

    /// Convert into a canonical record, filling defaults
    pub fn into_record(self) -> Record {
        match self {
            Self::Legacy {
                media,
                title,
                page_url,
            } => Record {
                media_kind: MediaKind::infer(&media),
                url: media,
                title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                source: page_url.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            },
            Self::Canonical {
                url,
                kind,
                title,
                source,
            } => Record {
                media_kind: kind
                    .as_deref()
                    .and_then(MediaKind::parse)
                    .unwrap_or_else(|| MediaKind::infer(&url)),
                url,
                title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize a single entry
pub fn normalize(value: &Value, position: usize) -> Result<Record, NormalizeError> {
    RawRecord::classify(value, position).map(RawRecord::into_record)
}

/// Outcome of normalizing and filtering a whole document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Admitted records, in document order
    pub records: Vec<Record>,
    /// Entries with no resource
    pub missing_resource: usize,
    /// Entries whose resource failed URL validation
    pub rejected: usize,
}

/// Normalize every entry and keep those whose URL passes `validator`
///
/// Per-entry failures are counted and the batch continues.
pub fn normalize_batch(entries: &[Value], validator: &UrlValidator) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (position, entry) in entries.iter().enumerate() {
        let record = match normalize(entry, position) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping entry");
                batch.missing_resource += 1;
                continue;
            }
        };

        match validator.validate(&record.url) {
            Ok(()) => batch.records.push(record),
            Err(reason) => {
                tracing::debug!(position, url = %record.url, %reason, "Rejected url");
                batch.rejected += 1;
            }
        }
    }

    batch
}
