//! pinwall - rotating wallpaper core
//!
//! Keeps a validated collection of wallpaper records, picks one at random on
//! a timer or on demand, and tells every open surface what changed.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Core data structures and types
//! - [`normalizer`] - Raw record decoding and URL validation
//! - [`cache`] - Persisted record collection and offline cache tooling
//! - [`scheduler`] - Random selection and timed rotation
//! - [`favorites`] - User-pinned records
//! - [`storage`] - Key-value persistence backends
//! - [`notifications`] - Event bus and theme side channel
//! - [`messages`] - Typed command dispatch
//! - [`render`] - Reselect-on-failure media loading
//! - [`trigger`] - HTTP trigger for the external scraper
//! - [`config`] - Configuration management and settings
//! - [`app`] - Application context wiring the above together
//!
//! # Example
//!
//! ```no_run
//! use pinwall::app::App;
//! use pinwall::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let app = App::open(config).await?;
//!     app.prepare().await?;
//!
//!     let selection = app.scheduler.advance_now().await?;
//!     println!("{}", selection.record.url);
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod messages;
pub mod models;
pub mod normalizer;
pub mod notifications;
pub mod render;
pub mod scheduler;
pub mod storage;
pub mod trigger;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::App;
    pub use crate::cache::CacheStore;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, PinwallErrorTrait, Result};
    pub use crate::favorites::FavoritesSet;
    pub use crate::models::{MediaKind, Record, RotationSettings, Selection};
    pub use crate::notifications::{Event, EventBus};
    pub use crate::scheduler::{RotationScheduler, Selector};
    pub use crate::storage::Storage;
}

// Direct re-exports for convenience
pub use models::{MediaKind, Record, RotationSettings, Selection};
