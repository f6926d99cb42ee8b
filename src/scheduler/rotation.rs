//! Timed wallpaper rotation
//!
//! A background timer task draws a new wallpaper every configured interval.
//! Reconfiguring persists the new settings and replaces the timer task, so
//! the new interval counts from the moment of reconfiguration.

use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::error::{SchedulerError, SchedulerResult, SelectorError, SelectorResult};
use super::selector::Selector;
use crate::models::{RotationSettings, Selection};
use crate::notifications::{Event, EventBus};
use crate::storage::{keys, Storage};

struct TimerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Drives periodic wallpaper changes
pub struct RotationScheduler {
    selector: Arc<Selector>,
    storage: Storage,
    bus: EventBus,
    settings: RwLock<RotationSettings>,
    timer: Mutex<Option<TimerHandle>>,
}

impl RotationScheduler {
    /// Create a scheduler using persisted settings, or defaults
    pub async fn open(selector: Arc<Selector>, storage: Storage, bus: EventBus) -> SchedulerResult<Self> {
        Self::open_with_defaults(selector, storage, bus, RotationSettings::default()).await
    }

    /// Like [`open`](Self::open), with caller-supplied fallback settings
    pub async fn open_with_defaults(
        selector: Arc<Selector>,
        storage: Storage,
        bus: EventBus,
        defaults: RotationSettings,
    ) -> SchedulerResult<Self> {
        let interval: u32 = storage
            .get(keys::ROTATION_INTERVAL)
            .await?
            .unwrap_or(defaults.interval_minutes);
        let enabled: bool = storage
            .get(keys::AUTO_CHANGE_ENABLED)
            .await?
            .unwrap_or(defaults.enabled);

        let settings = if interval < RotationSettings::MIN_INTERVAL_MINUTES {
            tracing::warn!(
                interval,
                fallback = defaults.interval_minutes,
                "Persisted rotation interval below minimum, using default"
            );
            RotationSettings::new(defaults.interval_minutes, enabled)
        } else {
            RotationSettings::new(interval, enabled)
        };

        Ok(Self::with_settings(selector, storage, bus, settings))
    }

    /// Create a scheduler with explicit settings, without reading storage
    pub fn with_settings(
        selector: Arc<Selector>,
        storage: Storage,
        bus: EventBus,
        settings: RotationSettings,
    ) -> Self {
        Self {
            selector,
            storage,
            bus,
            settings: RwLock::new(settings),
            timer: Mutex::new(None),
        }
    }

    pub async fn settings(&self) -> RotationSettings {
        *self.settings.read().await
    }

    /// Start the timer if it is not already running
    pub async fn start(&self) {
        let mut timer = self.timer.lock().await;
        if timer.is_none() {
            let settings = *self.settings.read().await;
            *timer = Some(self.spawn_timer(settings));
        }
    }

    /// Stop the timer and wait for its task to finish
    pub async fn stop(&self) {
        let handle = self.timer.lock().await.take();
        if let Some(handle) = handle {
            Self::shutdown(handle).await;
            tracing::info!("Rotation timer stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// Validate, persist and apply new settings, restarting the timer
    pub async fn reconfigure(&self, interval_minutes: u32, enabled: bool) -> SchedulerResult<RotationSettings> {
        if interval_minutes < RotationSettings::MIN_INTERVAL_MINUTES {
            return Err(SchedulerError::invalid_interval(interval_minutes));
        }
        let settings = RotationSettings::new(interval_minutes, enabled);

        let mut timer = self.timer.lock().await;

        self.storage
            .set_values(vec![
                (keys::ROTATION_INTERVAL, serde_json::Value::from(interval_minutes)),
                (keys::AUTO_CHANGE_ENABLED, serde_json::Value::Bool(enabled)),
            ])
            .await?;
        *self.settings.write().await = settings;

        if let Some(previous) = timer.take() {
            Self::shutdown(previous).await;
        }
        *timer = Some(self.spawn_timer(settings));
        drop(timer);

        tracing::info!(interval_minutes, enabled, "Rotation reconfigured");
        self.bus.publish(Event::RotationReconfigured(settings));

        Ok(settings)
    }

    /// Change the wallpaper immediately, regardless of `enabled`
    pub async fn advance_now(&self) -> SelectorResult<Selection> {
        self.selector.pick_random().await
    }

    fn spawn_timer(&self, settings: RotationSettings) -> TimerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_timer(Arc::clone(&self.selector), settings, shutdown_rx));

        tracing::debug!(
            interval_minutes = settings.interval_minutes,
            enabled = settings.enabled,
            "Rotation timer started"
        );

        TimerHandle { shutdown, task }
    }

    async fn shutdown(handle: TimerHandle) {
        let _ = handle.shutdown.send(true);
        let _ = handle.task.await;
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.task.abort();
        }
    }
}

async fn run_timer(selector: Arc<Selector>, settings: RotationSettings, mut shutdown_rx: watch::Receiver<bool>) {
    let period = settings.interval();
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !settings.enabled {
                    tracing::debug!("Rotation fired while disabled, skipping");
                } else {
                    match selector.pick_random().await {
                        Ok(selection) => {
                            tracing::debug!(index = selection.index, "Rotation fired");
                        }
                        Err(SelectorError::NoRecords) => {
                            tracing::warn!("Rotation fired with an empty cache");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Rotation failed");
                        }
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                break;
            }
        }
    }
}
