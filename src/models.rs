// Core data structures for pinwall

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder title for records that carry none
pub const DEFAULT_TITLE: &str = "Aesthetic Image";

/// Placeholder provenance label for records that carry none
pub const DEFAULT_SOURCE: &str = "Pinterest";

/// Kind of media a record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extensions rendered as video
    pub const VIDEO_EXTENSIONS: [&'static str; 3] = [".mp4", ".webm", ".mov"];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parse an explicit `type` field; unknown values yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Infer the kind from a URL's extension, ignoring query string and fragment
    pub fn infer(url: &str) -> Self {
        let path = strip_query(url).to_lowercase();
        if Self::VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            Self::Video
        } else {
            Self::Image
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cut a URL at the first `?` or `#`
pub fn strip_query(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(pos) => &url[..pos],
        None => url,
    }
}

/// One canonical wallpaper entry
///
/// Records are produced only by the normalizer and never patched afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub url: String,
    pub media_kind: MediaKind,
    pub title: String,
    pub source: String,
}

impl Record {
    /// Create a record with default title and source
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            media_kind: MediaKind::infer(&url),
            url,
            title: DEFAULT_TITLE.to_string(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the provenance label
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Membership equality used by favorites: url only
    pub fn same_resource(&self, other: &Record) -> bool {
        self.url == other.url
    }

    pub fn is_video(&self) -> bool {
        self.media_kind == MediaKind::Video
    }
}

/// The record currently shown, with where and when it was drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub record: Record,
    pub index: usize,
    pub selected_at: DateTime<Utc>,
}

impl Selection {
    pub fn new(record: Record, index: usize) -> Self {
        Self {
            record,
            index,
            selected_at: Utc::now(),
        }
    }

    /// Seconds elapsed since the selection was made
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.selected_at).num_seconds()
    }
}

/// Rotation timer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    pub interval_minutes: u32,
    pub enabled: bool,
}

impl RotationSettings {
    /// Shortest interval the settings surface offers
    pub const MIN_INTERVAL_MINUTES: u32 = 5;

    /// Interval options offered to the user, in minutes
    pub const INTERVAL_OPTIONS: [u32; 8] = [5, 10, 15, 30, 60, 120, 240, 1440];

    pub fn new(interval_minutes: u32, enabled: bool) -> Self {
        Self {
            interval_minutes,
            enabled,
        }
    }

    /// Timer period
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            enabled: true,
        }
    }
}

/// Saved position of the on-page controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlsPosition {
    pub x: f64,
    pub y: f64,
}
