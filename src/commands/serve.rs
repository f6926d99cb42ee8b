use anyhow::{Context, Result};

use pinwall::config::Config;
use pinwall::trigger::{ClientConfig, TriggerClient, TriggerServer};

/// Start the scrape trigger server
pub async fn serve(config: Config, bind: Option<String>) -> Result<()> {
    let mut trigger = config.trigger;
    if let Some(bind) = bind {
        trigger.bind_address = bind.parse().context("Invalid bind address")?;
    }
    let bind_address = trigger.bind_address;

    let server = TriggerServer::new(trigger).context("Failed to create trigger server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /api/health - Health check");
    println!("  POST /api/scrape - Run the scraper with {{\"keywords\": [...]}}");
    println!();
    println!("Trigger server listening on http://{bind_address}");
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Trigger server stopped.");
    Ok(())
}

/// Ask a running trigger server to scrape
pub async fn scrape(server: String, keywords: Vec<String>) -> Result<()> {
    let client = TriggerClient::new(ClientConfig::new(&server))?;

    println!("Requesting scrape from {server} for: {}", keywords.join(", "));
    let count = client.scrape(&keywords).await?;

    println!("Scraper wrote {count} records.");
    println!("Run `pinwall reload` to pick them up.");
    Ok(())
}
