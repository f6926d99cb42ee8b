//! Configuration management for pinwall
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::RotationSettings;
use crate::normalizer::url::DEFAULT_HOST_PATTERN;
use crate::trigger::TriggerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence configuration
    pub storage: StorageConfig,

    /// Bootstrap and validation configuration
    pub cache: CacheConfig,

    /// Rotation defaults used until the user saves settings
    pub rotation: RotationConfig,

    /// Scrape trigger configuration
    pub trigger: TriggerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON document per key
    pub data_dir: PathBuf,

    /// Keep everything in memory instead of on disk
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/pinwall"),
            in_memory: false,
        }
    }
}

/// Bootstrap and validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Bundled bootstrap document
    pub bootstrap_path: PathBuf,

    /// Regex the lowercased media host must match
    pub media_host_pattern: String,

    /// Version stamp; a change invalidates the persisted cache
    pub extension_version: String,

    /// Per-request timeout when verifying media loads, in seconds
    pub media_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bootstrap_path: PathBuf::from("extension/data/pinterest_cache.json"),
            media_host_pattern: DEFAULT_HOST_PATTERN.to_string(),
            extension_version: env!("CARGO_PKG_VERSION").to_string(),
            media_timeout_secs: 10,
        }
    }
}

/// Rotation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub interval_minutes: u32,
    pub enabled: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let settings = RotationSettings::default();
        Self {
            interval_minutes: settings.interval_minutes,
            enabled: settings.enabled,
        }
    }
}

impl RotationConfig {
    pub fn settings(&self) -> RotationSettings {
        RotationSettings::new(self.interval_minutes, self.enabled)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let data_dir = std::env::var("PINWALL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_dir);
        let in_memory = env_parse("PINWALL_IN_MEMORY").unwrap_or(defaults.storage.in_memory);

        let bootstrap_path = std::env::var("PINWALL_BOOTSTRAP_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache.bootstrap_path);
        let media_host_pattern =
            std::env::var("PINWALL_MEDIA_HOST_PATTERN").unwrap_or(defaults.cache.media_host_pattern);
        let extension_version =
            std::env::var("PINWALL_EXTENSION_VERSION").unwrap_or(defaults.cache.extension_version);
        let media_timeout_secs =
            env_parse("PINWALL_MEDIA_TIMEOUT").unwrap_or(defaults.cache.media_timeout_secs);

        let interval_minutes =
            env_parse("PINWALL_ROTATION_INTERVAL").unwrap_or(defaults.rotation.interval_minutes);
        let enabled = env_parse("PINWALL_AUTO_CHANGE").unwrap_or(defaults.rotation.enabled);

        let mut trigger = defaults.trigger;
        if let Ok(addr) = std::env::var("PINWALL_TRIGGER_BIND") {
            trigger.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid PINWALL_TRIGGER_BIND: {addr}"))?;
        }
        if let Ok(program) = std::env::var("PINWALL_SCRAPER_PROGRAM") {
            trigger.scraper_program = program;
        }
        if let Ok(args) = std::env::var("PINWALL_SCRAPER_ARGS") {
            trigger.scraper_args = args.split_whitespace().map(String::from).collect();
        }
        if let Ok(output) = std::env::var("PINWALL_SCRAPER_OUTPUT") {
            trigger.output_file = PathBuf::from(output);
        }
        if let Some(secs) = env_parse("PINWALL_SCRAPER_TIMEOUT") {
            trigger.timeout_secs = secs;
        }

        let level = std::env::var("PINWALL_LOG_LEVEL").unwrap_or(defaults.logging.level);
        let format = std::env::var("PINWALL_LOG_FORMAT").unwrap_or(defaults.logging.format);

        Ok(Self {
            storage: StorageConfig {
                data_dir,
                in_memory,
            },
            cache: CacheConfig {
                bootstrap_path,
                media_host_pattern,
                extension_version,
                media_timeout_secs,
            },
            rotation: RotationConfig {
                interval_minutes,
                enabled,
            },
            trigger,
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.rotation.interval_minutes < RotationSettings::MIN_INTERVAL_MINUTES {
            anyhow::bail!(
                "rotation.interval_minutes must be at least {}",
                RotationSettings::MIN_INTERVAL_MINUTES
            );
        }

        regex::Regex::new(&self.cache.media_host_pattern)
            .context("cache.media_host_pattern is not a valid regex")?;

        if self.cache.extension_version.trim().is_empty() {
            anyhow::bail!("cache.extension_version must not be empty");
        }

        if self.cache.media_timeout_secs == 0 {
            anyhow::bail!("cache.media_timeout_secs must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        self.trigger.validate().context("Invalid trigger configuration")?;

        Ok(())
    }

    /// Get media verification timeout as Duration
    #[must_use]
    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.cache.media_timeout_secs)
    }
}
