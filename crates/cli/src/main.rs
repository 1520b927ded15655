//! Ember & Wick CLI - catalog maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Report products that need attention
//! ew-cli check-products
//!
//! # Find candles by name, description or category
//! ew-cli search-candles "vanilla|cedar"
//! ```
//!
//! # Commands
//!
//! - `check-products` - Count products and flag missing images, zero stock
//!   and non-positive prices
//! - `search-candles` - Case-insensitive regex search over the catalog
//!
//! Both read the product collection through the same Firestore settings as
//! the storefront (`FIRESTORE_PROJECT_ID`, `FIRESTORE_BASE_URL`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ew-cli")]
#[command(author, version, about = "Ember & Wick CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products and flag missing images, zero stock or bad prices
    CheckProducts,
    /// Search candles by name, description and category
    SearchCandles {
        /// Regular expression, matched case-insensitively
        pattern: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::CheckProducts => commands::products::check_products().await?,
        Commands::SearchCandles { pattern } => {
            commands::products::search_candles(&pattern).await?;
        }
    }
    Ok(())
}
