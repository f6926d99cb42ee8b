//! Notification bus for wallpaper state changes
//!
//! Components publish [`Event`]s after their state is persisted; any number
//! of observers subscribe. Delivery is fire-and-forget: publishing with no
//! subscribers is not an error, and a lagging subscriber skips events rather
//! than blocking publishers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  ┌───────────────────┐  ┌────────────┐
//! │ Selector │  │ RotationScheduler │  │ CacheStore │
//! └────┬─────┘  └─────────┬─────────┘  └─────┬──────┘
//!      └──────────────────┼──────────────────┘
//!                         ▼
//!                 ┌──────────────┐
//!                 │   EventBus   │──► ThemePublisher
//!                 └──────┬───────┘
//!                ┌───────┴───────┐
//!                ▼               ▼
//!           observer A      observer B
//! ```

pub mod theme;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{Record, RotationSettings};

pub use theme::{StaticTheme, ThemeError, ThemePublisher, ThemeSource};

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

// ============================================================================
// Events
// ============================================================================

/// State change published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A new current wallpaper was selected and persisted
    WallpaperChanged(Record),

    /// Accent color derived from the current wallpaper
    ThemeUpdated { color: String },

    /// Rotation settings were changed and the timer restarted
    RotationReconfigured(RotationSettings),

    /// The cached collection was discarded
    CacheInvalidated,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WallpaperChanged(_) => "wallpaper_changed",
            Self::ThemeUpdated { .. } => "theme_updated",
            Self::RotationReconfigured(_) => "rotation_reconfigured",
            Self::CacheInvalidated => "cache_invalidated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel shared by publishers and observers
#[derive(Debug, Clone)]
pub struct EventBus {
    event_tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Publish an event, returning how many observers were listening
    pub fn publish(&self, event: Event) -> usize {
        let count = self.event_tx.receiver_count();
        tracing::trace!(event = event.name(), observers = count, "Publishing event");
        let _ = self.event_tx.send(event);
        count
    }

    pub fn observer_count(&self) -> usize {
        self.event_tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
