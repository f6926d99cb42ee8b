//! Wallpaper selection and rotation
//!
//! # Overview
//!
//! The [`Selector`] draws a uniformly random record from the cache and
//! persists it as the current selection. The [`RotationScheduler`] calls the
//! selector on a recurring timer whose interval and enabled flag are user
//! settings.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐  tick   ┌──────────┐  records  ┌────────────┐
//! │ RotationScheduler │────────►│ Selector │◄──────────│ CacheStore │
//! └─────────┬─────────┘         └────┬─────┘           └────────────┘
//!           │ rotationInterval       │ currentItem
//!           │ autoChangeEnabled      │ currentIndex
//!           ▼                        │ lastUpdated
//!     ┌──────────┐                   ▼
//!     │ Storage  │◄──────────────────┘
//!     └──────────┘
//! ```
//!
//! # Modules
//!
//! - [`selector`] - Random draw and current-selection persistence
//! - [`rotation`] - Interval timer and settings
//! - [`error`] - Selector and scheduler errors
//!
//! # Quick Start
//!
//! ```ignore
//! use pinwall::scheduler::{RotationScheduler, Selector};
//!
//! let selector = Arc::new(Selector::new(cache, storage.clone(), bus.clone()));
//! let scheduler = RotationScheduler::open(selector, storage, bus).await?;
//!
//! scheduler.reconfigure(30, true).await?;
//! let selection = scheduler.advance_now().await?;
//! println!("Now showing {}", selection.record.url);
//! ```
//!
//! # Interval Options
//!
//! | Minutes | Label |
//! |---------|-------|
//! | 5 | 5 minutes |
//! | 10 | 10 minutes |
//! | 15 | 15 minutes |
//! | 30 | 30 minutes |
//! | 60 | 1 hour (default) |
//! | 120 | 2 hours |
//! | 240 | 4 hours |
//! | 1440 | 1 day |
//!
//! Any interval of at least 5 minutes is accepted.

pub mod error;
pub mod rotation;
pub mod selector;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult, SelectorError, SelectorResult};
pub use rotation::RotationScheduler;
pub use selector::Selector;
