//! Scraper subprocess launcher

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;

use super::config::TriggerConfig;
use super::{TriggerError, TriggerResult};

/// Longest stderr excerpt kept in a failure report
const STDERR_EXCERPT_CHARS: usize = 500;

/// Runs the scraper program, one scrape at a time
pub struct ScrapeRunner {
    program: String,
    args: Vec<String>,
    output_file: PathBuf,
    timeout: Duration,
    running: Mutex<()>,
}

impl ScrapeRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>, output_file: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            output_file: output_file.into(),
            timeout,
            running: Mutex::new(()),
        }
    }

    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new(
            config.scraper_program.clone(),
            config.scraper_args.clone(),
            config.output_file.clone(),
            config.timeout(),
        )
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Run one scrape and return how many records the scraper wrote
    ///
    /// Keywords are appended after the configured arguments. A concurrent
    /// call while a scrape is running fails with [`TriggerError::Busy`].
    pub async fn run(&self, keywords: &[String]) -> TriggerResult<usize> {
        let keywords: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(TriggerError::InvalidRequest(
                "At least one keyword is required".to_string(),
            ));
        }

        let _guard = self.running.try_lock().map_err(|_| TriggerError::Busy)?;

        tracing::info!(program = %self.program, keywords = ?keywords, "Starting scrape");

        let child = Command::new(&self.program)
            .args(&self.args)
            .args(&keywords)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TriggerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the timed-out future drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| TriggerError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Scraper timed out");
                return Err(TriggerError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
            tracing::warn!(status = ?output.status.code(), "Scraper failed");
            return Err(TriggerError::ScraperFailed {
                status: output.status.code(),
                stderr: excerpt,
            });
        }

        let count = count_records(&self.output_file).await?;
        tracing::info!(count, path = %self.output_file.display(), "Scrape finished");
        Ok(count)
    }
}

/// Number of entries in the JSON array at `path`
pub async fn count_records(path: &Path) -> TriggerResult<usize> {
    let output_error = |reason: String| TriggerError::Output {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| output_error(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| output_error(e.to_string()))?;

    value
        .as_array()
        .map(Vec::len)
        .ok_or_else(|| output_error("expected a JSON array".to_string()))
}
