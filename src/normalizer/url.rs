//! Media URL validation and rewriting
//!
//! Only URLs that a rendering surface can load directly are admitted to the
//! cache: no object URLs, no inline data, no video thumbnail frames, a
//! recognized media extension, and a host belonging to the media provider.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Host pattern for the media provider CDN (`pinimg.com` and subdomains)
pub const DEFAULT_HOST_PATTERN: &str = r"^(?:[a-z0-9-]+\.)*pinimg\.com$";

/// Path extensions accepted by the validator
pub const ALLOWED_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4", ".webm"];

/// Thumbnail size segments rewritten by [`upgrade_to_original`]
const THUMBNAIL_SEGMENTS: [&str; 4] = ["/236x/", "/474x/", "/564x/", "/736x/"];

static THUMBNAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:236|474|564|736)x/").unwrap());

/// Why a URL was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    BlobScheme,
    DataScheme,
    VideoThumbnail,
    Unparseable,
    UnsupportedExtension,
    ForeignHost,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty url",
            Self::BlobScheme => "blob url",
            Self::DataScheme => "data url",
            Self::VideoThumbnail => "video thumbnail",
            Self::Unparseable => "unparseable url",
            Self::UnsupportedExtension => "unsupported extension",
            Self::ForeignHost => "host not on media provider",
        };
        f.write_str(reason)
    }
}

/// Validator for renderable media URLs
#[derive(Debug, Clone)]
pub struct UrlValidator {
    host_pattern: Regex,
}

impl UrlValidator {
    /// Create a validator with a custom host pattern
    ///
    /// The pattern is matched against the lowercased host only.
    pub fn new(host_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            host_pattern: Regex::new(host_pattern)?,
        })
    }

    pub fn host_pattern(&self) -> &str {
        self.host_pattern.as_str()
    }

    /// Check a URL, returning the first rule it breaks
    ///
    /// # Examples
    ///
    /// ```
    /// use pinwall::normalizer::url::{Rejection, UrlValidator};
    ///
    /// let validator = UrlValidator::default();
    /// assert!(validator.validate("https://i.pinimg.com/originals/a.jpg").is_ok());
    /// assert_eq!(validator.validate("blob:https://x"), Err(Rejection::BlobScheme));
    /// ```
    pub fn validate(&self, url: &str) -> Result<(), Rejection> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(Rejection::Empty);
        }

        let lower = trimmed.to_lowercase();
        if lower.starts_with("blob:") {
            return Err(Rejection::BlobScheme);
        }
        if lower.starts_with("data:") {
            return Err(Rejection::DataScheme);
        }
        if lower.contains("video-thumbnails") {
            return Err(Rejection::VideoThumbnail);
        }

        let parsed = Url::parse(trimmed).map_err(|_| Rejection::Unparseable)?;

        let path = parsed.path().to_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return Err(Rejection::UnsupportedExtension);
        }

        let host = parsed.host_str().ok_or(Rejection::ForeignHost)?.to_lowercase();
        if !self.host_pattern.is_match(&host) {
            return Err(Rejection::ForeignHost);
        }

        Ok(())
    }

    pub fn is_valid(&self, url: &str) -> bool {
        self.validate(url).is_ok()
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self {
            host_pattern: Regex::new(DEFAULT_HOST_PATTERN).unwrap(),
        }
    }
}

/// Rewrite CDN thumbnail size segments to the full-resolution path
///
/// # Examples
///
/// ```
/// use pinwall::normalizer::url::upgrade_to_original;
///
/// assert_eq!(
///     upgrade_to_original("https://i.pinimg.com/236x/ab/cd/ef.jpg"),
///     "https://i.pinimg.com/originals/ab/cd/ef.jpg"
/// );
/// ```
pub fn upgrade_to_original(url: &str) -> String {
    if !url.contains("pinimg.com") {
        return url.to_string();
    }
    THUMBNAIL_REGEX.replace_all(url, "/originals/").into_owned()
}

/// Resolution class of a CDN URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Original,
    Thumbnail,
    Unknown,
}

impl Quality {
    pub fn of(url: &str) -> Self {
        if url.contains("/originals/") {
            Self::Original
        } else if THUMBNAIL_SEGMENTS.iter().any(|seg| url.contains(seg)) {
            Self::Thumbnail
        } else {
            Self::Unknown
        }
    }
}
