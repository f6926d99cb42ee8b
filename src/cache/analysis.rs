//! Bootstrap document maintenance tools
//!
//! Offline inspection of a raw bootstrap document: shape and quality
//! statistics, sampling, de-duplication, thumbnail upgrading and a structure
//! check run before shipping a new document.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::models::MediaKind;
use crate::normalizer::{upgrade_to_original, Quality};

/// Resource URL of a raw entry: `media` first, then `url`
fn resource_url(entry: &Value) -> Option<&str> {
    ["media", "url"]
        .iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

// ============================================================================
// Analysis
// ============================================================================

/// Statistics over a raw document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheAnalysis {
    pub total: usize,
    /// Entries with a `media` field
    pub legacy_shape: usize,
    /// Entries with a `url` field and no `media`
    pub canonical_shape: usize,
    /// Entries with neither field
    pub unrecognized: usize,
    pub domains: DomainCounts,
    pub quality: QualityCounts,
    pub blob_urls: usize,
    pub video_urls: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainCounts {
    pub cdn: usize,
    pub site: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityCounts {
    pub original: usize,
    pub thumbnail: usize,
    pub unknown: usize,
}

/// Compute statistics over the entries of a document
pub fn analyze(entries: &[Value]) -> CacheAnalysis {
    let mut analysis = CacheAnalysis {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        if entry.get("media").is_some() {
            analysis.legacy_shape += 1;
        } else if entry.get("url").is_some() {
            analysis.canonical_shape += 1;
        } else {
            analysis.unrecognized += 1;
            continue;
        }

        let Some(url) = resource_url(entry) else {
            continue;
        };

        if url.contains("pinimg.com") {
            analysis.domains.cdn += 1;
        } else if url.contains("pinterest.com") {
            analysis.domains.site += 1;
        } else {
            analysis.domains.other += 1;
        }

        match Quality::of(url) {
            Quality::Original => analysis.quality.original += 1,
            Quality::Thumbnail => analysis.quality.thumbnail += 1,
            Quality::Unknown => analysis.quality.unknown += 1,
        }

        if url.starts_with("blob:") {
            analysis.blob_urls += 1;
        }
        if MediaKind::infer(url) == MediaKind::Video {
            analysis.video_urls += 1;
        }
    }

    analysis
}

/// First `count` entries
pub fn sample(entries: &[Value], count: usize) -> &[Value] {
    &entries[..count.min(entries.len())]
}

// ============================================================================
// Rewriting
// ============================================================================

/// Result of [`dedup`]
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    pub entries: Vec<Value>,
    pub removed: usize,
}

/// Drop entries whose resource URL was already seen
///
/// The first occurrence wins. Entries without a resource URL are dropped.
pub fn dedup(entries: &[Value]) -> Deduplicated {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(entries.len());

    for entry in entries {
        if let Some(url) = resource_url(entry) {
            if seen.insert(url.to_string()) {
                unique.push(entry.clone());
            }
        }
    }

    Deduplicated {
        removed: entries.len() - unique.len(),
        entries: unique,
    }
}

/// Rewrite thumbnail resource URLs to originals, returning how many changed
pub fn upgrade_thumbnails(entries: &mut [Value]) -> usize {
    let mut upgraded = 0;

    for entry in entries.iter_mut() {
        let Some(obj) = entry.as_object_mut() else {
            continue;
        };
        let key = if obj.get("media").and_then(Value::as_str).is_some_and(|s| !s.is_empty()) {
            "media"
        } else {
            "url"
        };
        if let Some(Value::String(url)) = obj.get_mut(key) {
            let original = upgrade_to_original(url);
            if original != *url {
                *url = original;
                upgraded += 1;
            }
        }
    }

    upgraded
}

// ============================================================================
// Structure Check
// ============================================================================

/// Severity of a structure finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckLevel {
    Pass,
    Warn,
    Fail,
}

/// One structure finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFinding {
    pub level: CheckLevel,
    pub message: String,
}

/// Findings for a whole document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub findings: Vec<CheckFinding>,
}

impl StructureReport {
    fn push(&mut self, level: CheckLevel, message: impl Into<String>) {
        self.findings.push(CheckFinding {
            level,
            message: message.into(),
        });
    }

    /// No finding failed
    pub fn passed(&self) -> bool {
        self.findings.iter().all(|f| f.level != CheckLevel::Fail)
    }

    pub fn warnings(&self) -> usize {
        self.findings.iter().filter(|f| f.level == CheckLevel::Warn).count()
    }
}

/// Check that a document is usable as a bootstrap document
///
/// Looks at the document shape and at its first entry only.
pub fn check_structure(document: &Value) -> StructureReport {
    let mut report = StructureReport::default();

    let Some(entries) = document.as_array() else {
        report.push(CheckLevel::Fail, "Document is not a JSON array");
        return report;
    };

    let Some(first) = entries.first() else {
        report.push(CheckLevel::Fail, "Document is empty");
        return report;
    };

    report.push(
        CheckLevel::Pass,
        format!("JSON array with {} entries", entries.len()),
    );

    let has = |key: &str| first.get(key).is_some();
    if has("media") && has("title") {
        report.push(CheckLevel::Pass, "Legacy shape (media field), converted on load");
    } else if has("url") && has("type") {
        report.push(CheckLevel::Pass, "Canonical shape (url field)");
    } else {
        report.push(CheckLevel::Warn, format!("Unexpected shape: {first}"));
    }

    if let Some(url) = resource_url(first) {
        if url.starts_with("blob:") {
            report.push(CheckLevel::Fail, "Blob URL detected, cannot be loaded");
            return report;
        }

        if url.contains("pinimg.com") {
            report.push(CheckLevel::Pass, "Media CDN URL");
        } else {
            report.push(CheckLevel::Warn, format!("URL not on media CDN: {url}"));
        }

        if Quality::of(url) == Quality::Original {
            report.push(CheckLevel::Pass, "Original quality URL");
        } else {
            report.push(CheckLevel::Warn, "Not an original quality URL, consider upgrading");
        }
    }

    report
}
