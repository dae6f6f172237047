//! ConstruMax CLI - Catalog inspection and cart management.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog (falls back to the built-in products on failure)
//! construmax catalog
//!
//! # Only in-stock products of one category, matching a search term
//! construmax catalog --category electricidad --search cable
//!
//! # Fail instead of falling back when the product sheet is unavailable
//! construmax catalog --strict
//!
//! # Inspect and edit the persisted cart
//! construmax cart show
//! construmax cart add taladro-001 -q 2
//! construmax cart set taladro-001 5
//! construmax cart remove taladro-001
//! ```
//!
//! # Commands
//!
//! - `catalog` - Load and list products
//! - `cart` - Show or change the cart stored in the data directory

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use construmax_storefront::config::{CatalogConfig, DEFAULT_CATALOG_URL};

mod commands;

#[derive(Parser)]
#[command(name = "construmax")]
#[command(author, version, about = "ConstruMax CLI tools")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the catalog and the cart live.
#[derive(Args)]
struct SourceArgs {
    /// Product sheet web app endpoint
    #[arg(long, global = true, env = "CONSTRUMAX_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Catalog request timeout in seconds
    #[arg(long, global = true, env = "CONSTRUMAX_CATALOG_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: String,

    /// Directory holding the persisted cart
    #[arg(long, global = true, env = "CONSTRUMAX_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the catalog and list its products
    Catalog {
        /// Only in-stock products of this category (`all` lists everything)
        #[arg(short, long)]
        category: Option<String>,

        /// Only featured, in-stock products
        #[arg(short, long)]
        featured: bool,

        /// Case-insensitive match on name or description
        #[arg(short, long)]
        search: Option<String>,

        /// Fail instead of using the built-in products
        #[arg(long)]
        strict: bool,
    },
    /// Show or change the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and totals
    Show,
    /// Add units of a product
    Add {
        /// Product ID
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Overwrite a line's quantity (0 or less removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        product_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let catalog_config = CatalogConfig::parse(&cli.source.catalog_url, &cli.source.timeout_secs)?;

    match cli.command {
        Commands::Catalog {
            category,
            featured,
            search,
            strict,
        } => {
            let query = commands::catalog::Query {
                category,
                featured,
                search,
            };
            commands::catalog::list(&catalog_config, &query, strict).await?;
        }
        Commands::Cart { action } => {
            let data_dir = &cli.source.data_dir;
            match action {
                CartAction::Show => commands::cart::show(&catalog_config, data_dir).await?,
                CartAction::Add {
                    product_id,
                    quantity,
                } => commands::cart::add(&catalog_config, data_dir, &product_id, quantity).await?,
                CartAction::Set {
                    product_id,
                    quantity,
                } => {
                    commands::cart::set(&catalog_config, data_dir, &product_id, quantity).await?;
                }
                CartAction::Remove { product_id } => {
                    commands::cart::remove(data_dir, &product_id);
                }
            }
        }
    }
    Ok(())
}
