//! Trigger server configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default bind address, loopback only
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

/// Configuration for the scrape trigger server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Program launched for each scrape
    pub scraper_program: String,

    /// Arguments placed before the requested keywords
    pub scraper_args: Vec<String>,

    /// JSON array the scraper writes its records to
    pub output_file: PathBuf,

    /// Scrape time budget in seconds
    pub timeout_secs: u64,

    /// Enable CORS for API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            scraper_program: "python3".to_string(),
            scraper_args: vec!["pinterest_scraper.py".to_string()],
            output_file: PathBuf::from("extension/data/pinterest_cache.json"),
            timeout_secs: 600,
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

impl TriggerConfig {
    /// Create a new config builder
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper_program.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "scraper_program".to_string(),
            });
        }

        if self.output_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "output_file".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                reason: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for TriggerConfig
#[derive(Debug, Default)]
pub struct TriggerConfigBuilder {
    bind_address: Option<SocketAddr>,
    scraper_program: Option<String>,
    scraper_args: Option<Vec<String>>,
    output_file: Option<PathBuf>,
    timeout_secs: Option<u64>,
    enable_cors: Option<bool>,
    enable_request_logging: Option<bool>,
}

impl TriggerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(addr.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_address".to_string(),
            reason: format!("Invalid address: {}", addr),
        })?);
        Ok(self)
    }

    pub fn scraper_program(mut self, program: impl Into<String>) -> Self {
        self.scraper_program = Some(program.into());
        self
    }

    pub fn scraper_args(mut self, args: Vec<String>) -> Self {
        self.scraper_args = Some(args);
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Set scrape timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Enable/disable CORS
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = Some(enable);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<TriggerConfig, ConfigError> {
        let defaults = TriggerConfig::default();
        let config = TriggerConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            scraper_program: self.scraper_program.unwrap_or(defaults.scraper_program),
            scraper_args: self.scraper_args.unwrap_or(defaults.scraper_args),
            output_file: self.output_file.unwrap_or(defaults.output_file),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            enable_cors: self.enable_cors.unwrap_or(defaults.enable_cors),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
    MissingField { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            Self::MissingField { field } => {
                write!(f, "Missing required field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
