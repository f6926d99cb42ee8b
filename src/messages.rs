//! Typed command dispatch
//!
//! Rendering surfaces and the settings surface talk to the core through
//! [`Command`]s. Each command carries a oneshot responder typed for its
//! reply. A single [`Dispatcher`] task drains the queue, so externally
//! triggered commands are processed one at a time in arrival order.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::favorites::{FavoritesResult, FavoritesSet, ToggleOutcome};
use crate::models::{Record, RotationSettings, Selection};
use crate::notifications::ThemePublisher;
use crate::scheduler::{RotationScheduler, SchedulerResult, Selector, SelectorResult};

/// Queue depth for pending commands
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Command with its typed responder
#[derive(Debug)]
pub enum Command {
    /// Draw a new wallpaper now
    NextImage {
        responder: oneshot::Sender<SelectorResult<Selection>>,
    },

    /// Publish an accent color sampled by a rendering surface
    UpdateTheme {
        color: String,
        responder: oneshot::Sender<bool>,
    },

    /// Change rotation settings
    UpdateRotationInterval {
        interval_minutes: u32,
        enabled: bool,
        responder: oneshot::Sender<SchedulerResult<RotationSettings>>,
    },

    /// Add or remove a favorite
    ToggleFavorite {
        record: Record,
        responder: oneshot::Sender<FavoritesResult<ToggleOutcome>>,
    },

    /// Read the current selection
    GetCurrent {
        responder: oneshot::Sender<SelectorResult<Option<Selection>>>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NextImage { .. } => "next_image",
            Self::UpdateTheme { .. } => "update_theme",
            Self::UpdateRotationInterval { .. } => "update_rotation_interval",
            Self::ToggleFavorite { .. } => "toggle_favorite",
            Self::GetCurrent { .. } => "get_current",
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Single consumer of the command queue
pub struct Dispatcher {
    selector: Arc<Selector>,
    scheduler: Arc<RotationScheduler>,
    favorites: Arc<FavoritesSet>,
    theme: ThemePublisher,
    commands: mpsc::Receiver<Command>,
}

impl Dispatcher {
    /// Spawn the dispatcher task and return a handle for sending commands
    pub fn spawn(
        selector: Arc<Selector>,
        scheduler: Arc<RotationScheduler>,
        favorites: Arc<FavoritesSet>,
        theme: ThemePublisher,
    ) -> (DispatcherHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let dispatcher = Self {
            selector,
            scheduler,
            favorites,
            theme,
            commands,
        };
        let task = tokio::spawn(dispatcher.run());
        (DispatcherHandle { commands: tx }, task)
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            let name = command.name();
            tracing::debug!(command = name, "Dispatching command");

            // A dropped responder means the caller stopped waiting
            let delivered = match command {
                Command::NextImage { responder } => {
                    responder.send(self.scheduler.advance_now().await).is_ok()
                }
                Command::UpdateTheme { color, responder } => {
                    responder.send(self.theme.publish_color(&color)).is_ok()
                }
                Command::UpdateRotationInterval {
                    interval_minutes,
                    enabled,
                    responder,
                } => responder
                    .send(self.scheduler.reconfigure(interval_minutes, enabled).await)
                    .is_ok(),
                Command::ToggleFavorite { record, responder } => {
                    responder.send(self.favorites.toggle(record).await).is_ok()
                }
                Command::GetCurrent { responder } => {
                    responder.send(self.selector.current().await).is_ok()
                }
            };

            if !delivered {
                tracing::debug!(command = name, "Caller dropped before reply");
            }
        }

        tracing::debug!("Command queue closed, dispatcher exiting");
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable sender side of the command queue
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    commands: mpsc::Sender<Command>,
}

impl DispatcherHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (responder, reply) = oneshot::channel();
        self.commands
            .send(build(responder))
            .await
            .map_err(|_| Error::DispatcherClosed)?;
        reply.await.map_err(|_| Error::DispatcherClosed)
    }

    pub async fn next_image(&self) -> Result<Selection> {
        Ok(self
            .request(|responder| Command::NextImage { responder })
            .await??)
    }

    pub async fn update_theme(&self, color: impl Into<String>) -> Result<bool> {
        let color = color.into();
        self.request(|responder| Command::UpdateTheme { color, responder })
            .await
    }

    pub async fn update_rotation_interval(&self, interval_minutes: u32, enabled: bool) -> Result<RotationSettings> {
        Ok(self
            .request(|responder| Command::UpdateRotationInterval {
                interval_minutes,
                enabled,
                responder,
            })
            .await??)
    }

    pub async fn toggle_favorite(&self, record: Record) -> Result<ToggleOutcome> {
        Ok(self
            .request(|responder| Command::ToggleFavorite { record, responder })
            .await??)
    }

    pub async fn get_current(&self) -> Result<Option<Selection>> {
        Ok(self
            .request(|responder| Command::GetCurrent { responder })
            .await??)
    }
}
