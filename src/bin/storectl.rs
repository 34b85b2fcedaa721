//! `storectl` — a small diagnostics CLI over an opened storage handle,
//! grounded in the teacher's `tools/diagnostics/check_db.rs` style but
//! rebuilt against the backend/config abstractions instead of opening
//! RocksDB directly.

use clap::{Parser, Subcommand};
use indexer_storage::backend::open_backend;
use indexer_storage::config::{load_config, BackendConfig};

#[derive(Parser)]
#[command(name = "storectl", about = "Inspect an indexer-storage database")]
struct Cli {
    /// Path to the database directory. Overrides config.toml/env.
    #[arg(long)]
    path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print `/meta/*` counters.
    Meta,
    /// List registered backend type tags.
    Backends,
}

fn resolve_config(cli_path: Option<String>) -> BackendConfig {
    let mut config = load_config().unwrap_or_else(|_| BackendConfig::default_for(""));
    if let Some(path) = cli_path {
        config.path = path;
    }
    config.read_only = true;
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    indexer_storage::telemetry::init_tracing(indexer_storage::telemetry::TelemetryConfig::default())?;
    let cli = Cli::parse();

    match cli.command {
        Command::Meta => {
            let config = resolve_config(cli.path);
            let backend = open_backend(&config)?;
            let latest_height = backend.get(indexer_storage::keys::KEY_LATEST_HEIGHT.as_bytes())?;
            let block_count = backend.get(indexer_storage::keys::KEY_BLOCK_COUNT.as_bytes())?;
            let tx_count = backend.get(indexer_storage::keys::KEY_TX_COUNT.as_bytes())?;
            println!("latest height: {:?}", latest_height.map(hex::encode));
            println!("block count:   {:?}", block_count.map(hex::encode));
            println!("tx count:      {:?}", tx_count.map(hex::encode));
        }
        Command::Backends => {
            let registry = indexer_storage::backend::registry::default_registry();
            for tag in registry.supported_types() {
                println!("{tag}");
            }
        }
    }

    Ok(())
}
