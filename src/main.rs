use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinwall::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "pinwall",
    version,
    about = "Rotating wallpaper cache with favorites and a local scrape trigger",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (defaults to PINWALL_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the bootstrap document unless a cache is already persisted
    Bootstrap {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Discard the persisted cache and load the bootstrap document again
    Reload {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show a new random wallpaper now
    Next {
        /// Check the media loads, reselecting on failure
        #[arg(long, default_value = "false")]
        verify: bool,
    },

    /// Print the current wallpaper
    Current,

    /// Run the rotation timer until Ctrl+C
    Run,

    /// Show or change rotation settings
    Settings {
        /// Rotation interval in minutes (at least 5)
        #[arg(short, long)]
        interval: Option<u32>,

        /// Enable or disable automatic rotation
        #[arg(short, long)]
        enabled: Option<bool>,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Print statistics about a bootstrap document
    Analyze {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the first entries of a bootstrap document
    Sample {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of entries
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Remove duplicate entries from a bootstrap document
    Dedup {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also rewrite thumbnail URLs to originals
        #[arg(long, default_value = "false")]
        upgrade: bool,
    },

    /// Drop entries whose media no longer loads, backing up the original
    Validate {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Requests in flight at once
        #[arg(long, default_value = "10")]
        concurrency: usize,
    },

    /// Check that a bootstrap document is usable
    Check {
        /// Bootstrap document (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Run the scrape trigger server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Ask a running trigger server to scrape
    Scrape {
        /// Search keywords
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Trigger server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites in insertion order
    List,

    /// Add a URL, or remove it if already a favorite
    Toggle {
        /// Resource URL
        url: String,

        /// Title for a newly added favorite
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Remove the favorite at an index
    Remove {
        /// Zero-based index as shown by `favorites list`
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_format = cli.log_format.clone().unwrap_or_else(|| config.logging.format.clone());

    // Initialize tracing/logging
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("pinwall starting");

    match cli.command {
        Commands::Bootstrap { input } => {
            tracing::info!(input = ?input, "Starting bootstrap command");
            commands::bootstrap(config, input, false).await?;
        }

        Commands::Reload { input } => {
            tracing::info!(input = ?input, "Starting reload command");
            commands::bootstrap(config, input, true).await?;
        }

        Commands::Next { verify } => {
            tracing::info!(verify = %verify, "Starting next command");
            commands::next(config, verify).await?;
        }

        Commands::Current => {
            commands::current(config).await?;
        }

        Commands::Run => {
            tracing::info!("Starting rotation daemon");
            commands::run(config).await?;
        }

        Commands::Settings { interval, enabled } => {
            commands::settings(config, interval, enabled).await?;
        }

        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites_list(config).await?,
            FavoritesAction::Toggle { url, title } => {
                commands::favorites_toggle(config, url, title).await?
            }
            FavoritesAction::Remove { index } => commands::favorites_remove(config, index).await?,
        },

        Commands::Analyze { input } => {
            commands::analyze(&config, input).await?;
        }

        Commands::Sample { input, count } => {
            commands::sample(&config, input, count).await?;
        }

        Commands::Dedup {
            input,
            output,
            upgrade,
        } => {
            tracing::info!(input = ?input, output = ?output, upgrade = %upgrade, "Starting dedup command");
            commands::dedup(&config, input, output, upgrade).await?;
        }

        Commands::Validate {
            input,
            output,
            concurrency,
        } => {
            tracing::info!(input = ?input, output = ?output, concurrency, "Starting validate command");
            commands::validate(&config, input, output, concurrency).await?;
        }

        Commands::Check { input } => {
            commands::check(&config, input).await?;
        }

        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting trigger server");
            commands::serve(config, bind).await?;
        }

        Commands::Scrape { keywords, server } => {
            tracing::info!(keywords = ?keywords, server = %server, "Starting scrape command");
            commands::scrape(server, keywords).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("pinwall=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("pinwall={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
