//! Tiercache - maintenance tool for a cache stack
//!
//! Opens the configured stack and inspects or purges it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercache::{Cache, CacheStack, Config};

#[derive(Debug, Parser)]
#[command(name = "tiercache", version, about = "Inspect and purge a tiered object cache")]
struct Cli {
    /// Disk cache root (overrides CACHE_DIR)
    #[arg(long, env = "CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print per-tier statistics as JSON
    Stats,
    /// Write the cached bytes for a key to stdout
    Get { key: String },
    /// Delete a key, or every key with a prefix when it ends in `*`
    Purge { pattern: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiercache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    let stack = CacheStack::from_config(&config).await?;

    match cli.command {
        Command::Stats => {
            let stats = stack.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Get { key } => match stack.cache.get(&key, None).await {
            Ok(object) => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&object.data).await?;
                stdout.flush().await?;
            }
            Err(err) if err.is_not_found() => {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Purge { pattern } => {
            stack.cache.del(&pattern).await;
            info!("Purged {}", pattern);
        }
    }

    Ok(ExitCode::SUCCESS)
}
