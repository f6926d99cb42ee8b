use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use pinwall::app::App;
use pinwall::cache::analysis::{self, CheckLevel};
use pinwall::cache::read_document;
use pinwall::cache::reachability::{backup_path, prune_unreachable};
use pinwall::config::Config;
use pinwall::error::Error;
use pinwall::render::HttpMediaLoader;

fn input_path(config: &Config, input: Option<PathBuf>) -> PathBuf {
    input.unwrap_or_else(|| config.cache.bootstrap_path.clone())
}

async fn read_entries(path: &Path) -> Result<Vec<Value>> {
    let document = read_document(path).await?;
    match document {
        Value::Array(entries) => Ok(entries),
        _ => anyhow::bail!("{} is not a JSON array", path.display()),
    }
}

pub async fn bootstrap(mut config: Config, input: Option<PathBuf>, force: bool) -> Result<()> {
    config.cache.bootstrap_path = input_path(&config, input);
    let path = config.cache.bootstrap_path.clone();
    let app = App::open(config).await?;

    let outcome = if force {
        // The working collection stays until the new document yields records
        app.cache.reload_from_path(&path).await.map(Some).map_err(Error::from)
    } else {
        app.prepare().await
    };

    match outcome {
        Ok(Some(report)) => {
            println!("Bootstrapped from {}", path.display());
            println!("  Admitted: {}", report.admitted);
            println!("  Missing resource: {}", report.missing_resource);
            println!("  Rejected: {}", report.rejected);
        }
        Ok(None) => {
            println!(
                "Cache already loaded ({} records). Use `pinwall reload` to replace it.",
                app.cache.len().await
            );
        }
        Err(Error::Cache(e)) => {
            println!("Bootstrap failed: {e}");
            println!("Run the scraper, then `pinwall reload`.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub async fn analyze(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let path = input_path(config, input);
    let entries = read_entries(&path).await?;
    let stats = analysis::analyze(&entries);

    println!("Cache Analysis: {}", path.display());
    println!("{:-<40}", "");
    println!("Total entries: {}", stats.total);
    println!("  Legacy shape (media): {}", stats.legacy_shape);
    println!("  Canonical shape (url): {}", stats.canonical_shape);
    println!("  Unrecognized: {}", stats.unrecognized);
    println!("Domains:");
    println!("  Media CDN: {}", stats.domains.cdn);
    println!("  Site pages: {}", stats.domains.site);
    println!("  Other: {}", stats.domains.other);
    println!("Quality:");
    println!("  Original: {}", stats.quality.original);
    println!("  Thumbnail: {}", stats.quality.thumbnail);
    println!("  Unknown: {}", stats.quality.unknown);
    println!("Blob URLs: {}", stats.blob_urls);
    println!("Video URLs: {}", stats.video_urls);

    if stats.blob_urls > 0 {
        println!("\nWarning: blob URLs cannot be loaded; run the scraper again.");
    }
    if stats.quality.thumbnail > 0 {
        println!("\nTip: `pinwall dedup --upgrade` rewrites thumbnails to originals.");
    }

    Ok(())
}

pub async fn sample(config: &Config, input: Option<PathBuf>, count: usize) -> Result<()> {
    let path = input_path(config, input);
    let entries = read_entries(&path).await?;

    for (i, entry) in analysis::sample(&entries, count).iter().enumerate() {
        println!("#{i}");
        println!("{}", serde_json::to_string_pretty(entry)?);
    }
    println!("Showing {} of {}", count.min(entries.len()), entries.len());

    Ok(())
}

pub async fn dedup(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    upgrade: bool,
) -> Result<()> {
    let path = input_path(config, input);
    let entries = read_entries(&path).await?;

    let mut result = analysis::dedup(&entries);
    let upgraded = if upgrade {
        analysis::upgrade_thumbnails(&mut result.entries)
    } else {
        0
    };

    let output = output.unwrap_or_else(|| path.clone());
    let bytes = serde_json::to_vec_pretty(&result.entries)?;
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Removed {} duplicate or empty entries", result.removed);
    if upgrade {
        println!("Upgraded {upgraded} thumbnail URLs");
    }
    println!("Wrote {} entries to {}", result.entries.len(), output.display());

    Ok(())
}

pub async fn validate(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: usize,
) -> Result<()> {
    let path = input_path(config, input);
    let entries = read_entries(&path).await?;
    println!("Checking {} entries from {}", entries.len(), path.display());

    let loader = HttpMediaLoader::new(config.media_timeout())?.require_media_type();
    let pruned = prune_unreachable(&entries, &loader, concurrency).await;

    println!("  Reachable: {}", pruned.entries.len());
    println!("  Unreachable: {}", pruned.unreachable);
    println!("  Missing resource: {}", pruned.missing_resource);

    if pruned.entries.is_empty() {
        anyhow::bail!("No entry of {} is reachable; leaving it unchanged", path.display());
    }
    if pruned.removed() == 0 {
        println!("Nothing to remove");
        return Ok(());
    }

    let output = output.unwrap_or_else(|| path.clone());
    if output == path {
        let backup = backup_path(&path);
        tokio::fs::copy(&path, &backup)
            .await
            .with_context(|| format!("Failed to back up {}", path.display()))?;
        println!("Backed up original to {}", backup.display());
    }

    let bytes = serde_json::to_vec_pretty(&pruned.entries)?;
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} entries to {}", pruned.entries.len(), output.display());

    Ok(())
}

pub async fn check(config: &Config, input: Option<PathBuf>) -> Result<()> {
    let path = input_path(config, input);
    let document = read_document(&path).await?;
    let report = analysis::check_structure(&document);

    println!("Structure check: {}", path.display());
    for finding in &report.findings {
        let mark = match finding.level {
            CheckLevel::Pass => "ok",
            CheckLevel::Warn => "warn",
            CheckLevel::Fail => "FAIL",
        };
        println!("  [{mark}] {}", finding.message);
    }

    if !report.passed() {
        anyhow::bail!("{} is not usable as a bootstrap document", path.display());
    }
    println!("Passed with {} warning(s)", report.warnings());
    Ok(())
}
