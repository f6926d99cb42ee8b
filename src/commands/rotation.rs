use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use pinwall::app::App;
use pinwall::config::Config;
use pinwall::models::Selection;
use pinwall::notifications::Event;
use pinwall::render::{load_with_reselect, HttpMediaLoader, ReselectConfig};
use pinwall::scheduler::SelectorError;

use super::prepare_or_warn;

fn print_selection(selection: &Selection) {
    println!("{}", selection.record.url);
    println!("  Title: {}", selection.record.title);
    println!("  Source: {}", selection.record.source);
    println!("  Kind: {}", selection.record.media_kind);
    println!("  Index: {}", selection.index);
    println!("  Selected: {}", selection.selected_at.to_rfc3339());
}

fn no_records_hint() {
    println!("No wallpapers available. Run `pinwall bootstrap` or `pinwall reload` first.");
}

pub async fn next(config: Config, verify: bool) -> Result<()> {
    let media_timeout = config.media_timeout();
    let app = App::open(config).await?;
    prepare_or_warn(&app).await?;

    let selection = match app.scheduler.advance_now().await {
        Ok(selection) => selection,
        Err(SelectorError::NoRecords) => {
            no_records_hint();
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let selection = if verify {
        let loader = HttpMediaLoader::new(media_timeout)?;
        let selector = Arc::clone(&app.selector);
        let loaded = load_with_reselect(&ReselectConfig::default(), &loader, selection, || {
            let selector = Arc::clone(&selector);
            async move { selector.pick_random().await }
        })
        .await?;
        if loaded.attempts > 1 {
            println!("Reselected {} time(s) after load failures", loaded.attempts - 1);
        }
        loaded.selection
    } else {
        selection
    };

    print_selection(&selection);
    Ok(())
}

pub async fn current(config: Config) -> Result<()> {
    let app = App::open(config).await?;

    match app.selector.current().await? {
        Some(selection) => print_selection(&selection),
        None => println!("No wallpaper selected yet. Run `pinwall next`."),
    }
    Ok(())
}

pub async fn run(config: Config) -> Result<()> {
    let app = App::open(config).await?;
    prepare_or_warn(&app).await?;

    let settings = app.scheduler.settings().await;
    println!("Rotation Daemon");
    println!("{:-<40}", "");
    println!("Interval: {} minutes", settings.interval_minutes);
    println!("Auto change: {}", if settings.enabled { "enabled" } else { "disabled" });
    println!("Records: {}", app.cache.len().await);
    println!("Press Ctrl+C to stop.\n");

    let mut events = app.bus.subscribe();
    let theme_task = app.theme.clone().spawn();
    let (commands, dispatcher_task) = app.dispatcher();

    // Show something immediately, like a freshly opened page
    if app.selector.current().await?.is_none() {
        match commands.next_image().await {
            Ok(_) => {}
            Err(pinwall::error::Error::Selector(SelectorError::NoRecords)) => no_records_hint(),
            Err(e) => return Err(e.into()),
        }
    }

    app.scheduler.start().await;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => tracing::error!("Failed to wait for Ctrl+C: {}", e),
                }
                break;
            }
            event = events.recv() => match event {
                Ok(Event::WallpaperChanged(record)) => {
                    println!("Wallpaper: {} ({})", record.url, record.title);
                }
                Ok(Event::ThemeUpdated { color }) => {
                    tracing::debug!(color = %color, "Theme updated");
                }
                Ok(other) => tracing::info!(event = other.name(), "Event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    app.shutdown().await;
    drop(commands);
    let _ = dispatcher_task.await;
    theme_task.abort();

    println!("Rotation daemon stopped.");
    Ok(())
}

pub async fn settings(config: Config, interval: Option<u32>, enabled: Option<bool>) -> Result<()> {
    let app = App::open(config).await?;
    let mut current = app.scheduler.settings().await;

    if interval.is_some() || enabled.is_some() {
        current = app
            .scheduler
            .reconfigure(
                interval.unwrap_or(current.interval_minutes),
                enabled.unwrap_or(current.enabled),
            )
            .await?;
        app.shutdown().await;
        println!("Settings saved.");
    }

    println!("Interval: {} minutes", current.interval_minutes);
    println!("Auto change: {}", if current.enabled { "enabled" } else { "disabled" });
    println!("Dark mode: {}", app.preferences.dark_mode().await?);
    Ok(())
}
