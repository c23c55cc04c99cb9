//! `mailimage`: accepts image submissions by mail and serves the published entries.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailimage_cli::{delete, insert, serve, Stores};
use mailimage_core::Config;
use mailimage_infra::{init_telemetry, TelemetryConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mailimage", about = "Image submissions by email")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the listing, images, thumbnails and delete links over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:5000")]
        listen: String,
    },
    /// Read one message from stdin and run it through the submission pipeline
    Insert {
        /// Print replies to stdout instead of sending them, log to stderr
        #[arg(long)]
        debug: bool,
    },
    /// Delete an entry and its files
    Delete {
        /// Entry ID
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Commands::Insert { debug: true } = cli.command {
        config.debug = true;
    }

    init_telemetry(&TelemetryConfig::from_config(&config))?;

    let config = Arc::new(config);
    let stores = Stores::open(&config).await?;

    match cli.command {
        Commands::Serve { listen } => serve(config, stores, &listen).await?,
        Commands::Insert { .. } => {
            insert(config, stores, tokio::io::stdin()).await?;
        }
        Commands::Delete { id } => {
            delete(config, stores, id).await?;
            println!("Deleted entry {}", id);
        }
    }

    Ok(())
}
