pub mod cache;
pub mod favorites;
pub mod rotation;
pub mod serve;

// Re-export command functions for convenience
pub use cache::{analyze, bootstrap, check, dedup, sample, validate};
pub use favorites::{favorites_list, favorites_remove, favorites_toggle};
pub use rotation::{current, next, run, settings};
pub use serve::{scrape, serve};

use anyhow::Result;
use pinwall::app::App;
use pinwall::cache::CacheError;
use pinwall::error::Error;

/// Load the bootstrap document if needed, reporting instead of failing
///
/// Commands that only read the cache keep working from whatever is
/// persisted when the bootstrap document is missing or unusable.
pub(crate) async fn prepare_or_warn(app: &App) -> Result<()> {
    match app.prepare().await {
        Ok(Some(report)) => {
            println!(
                "Loaded {} records ({} missing resource, {} rejected)",
                report.admitted, report.missing_resource, report.rejected
            );
        }
        Ok(None) => {}
        Err(Error::Cache(e @ (CacheError::EmptyCache { .. } | CacheError::Read { .. }))) => {
            tracing::warn!(error = %e, "Bootstrap skipped");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
