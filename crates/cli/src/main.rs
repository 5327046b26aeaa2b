//! Stocklink CLI - Marketplace sync and log inspection tools.
//!
//! # Usage
//!
//! ```bash
//! # Sync shop 1's catalog from its platform
//! stocklink sync --shop 1
//!
//! # Preview an import without writing anything
//! stocklink sync --shop 1 --dry-run
//!
//! # Sync and print the protocol's log trail afterwards
//! stocklink sync --shop 1 --show-log
//!
//! # Page through sync log entries, newest first
//! stocklink logs --limit 20 --offset 20
//!
//! # List registered adapter platforms
//! stocklink platforms
//! ```
//!
//! Configuration comes from environment variables (see `stocklink-sync`'s
//! config module); the connected shop's credentials are seeded from
//! `SHOP_PLATFORM` / `SHOP_ACCESS_TOKEN` / `SHOP_REFRESH_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stocklink")]
#[command(author, version, about = "Stocklink marketplace sync tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync one shop's product catalog into the internal store
    Sync {
        /// Shop id to sync
        #[arg(short, long, default_value_t = 1)]
        shop: i32,

        /// Compute the import without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the sync log trail after the run
        #[arg(long)]
        show_log: bool,

        /// Maximum log entries to print with --show-log
        #[arg(long, default_value_t = 50)]
        log_limit: usize,
    },
    /// List sync log entries newest-first
    Logs {
        /// Maximum entries to print
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Entries to skip from the newest end
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// List registered adapter platforms
    Platforms,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sync {
            shop,
            dry_run,
            show_log,
            log_limit,
        } => {
            commands::sync::run(shop, dry_run, show_log, log_limit).await?;
        }
        Commands::Logs { limit, offset } => {
            commands::logs::run(limit, offset).await?;
        }
        Commands::Platforms => {
            commands::platforms::run()?;
        }
    }
    Ok(())
}
