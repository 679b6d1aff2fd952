//! ChatVault - chat history snapshots to cloud storage
//!
#![doc = "ChatVault - chat history snapshots to cloud storage"]
#![doc = "Main entry point for the ChatVault application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatvault::cli::{Cli, Commands};
use chatvault::commands;
use chatvault::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Auth => {
            tracing::info!("Starting sign-in for store: {}", config.store.store_type);
            commands::auth::authenticate(&config).await?;
            Ok(())
        }
        Commands::Logout => {
            commands::auth::logout(&config).await?;
            Ok(())
        }
        Commands::Backup => {
            commands::snapshots::backup(&config).await?;
            Ok(())
        }
        Commands::List { json } => {
            commands::snapshots::list(&config, json).await?;
            Ok(())
        }
        Commands::Restore { snapshot } => {
            if let Some(s) = &snapshot {
                tracing::debug!("Restoring requested snapshot: {}", s);
            }
            commands::snapshots::restore(&config, snapshot).await?;
            Ok(())
        }
        Commands::Watch => {
            tracing::info!("Starting backup scheduler");
            commands::snapshots::watch(&config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Diagnostics go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "chatvault=debug"
    } else {
        "chatvault=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
