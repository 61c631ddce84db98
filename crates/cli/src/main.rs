//! Velostore CLI - database migrations and catalog seeding.
//!
//! ```bash
//! velo-cli migrate   # apply storefront migrations
//! velo-cli seed      # load demo products and variants
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "velo-cli", author, version, about = "Velostore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply database migrations
    Migrate,
    /// Seed the catalog with demo products and variants
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let outcome: Result<(), Box<dyn std::error::Error>> = match Cli::parse().command {
        Command::Migrate => commands::migrate::run().await.map_err(Into::into),
        Command::Seed => commands::seed::run().await,
    };

    if let Err(e) = outcome {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
