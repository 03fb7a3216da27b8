//! DRS CLI - operator command surface for the record and blob stores

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use drs_common::logging::{init_logging, LogConfig, LogLevel};
use drs_store::{Store, StoreConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "drs")]
#[command(author, version, about = "DRS record and blob store maintenance tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show information about what we have in storage
    Diagnostics {
        /// Business keys to inspect; three sampled records when omitted
        #[arg(short, long, num_args = 0..)]
        keys: Vec<String>,
    },

    /// Show current values of the key/value bookkeeping table
    Kv,

    /// Bulk-load binary files listed in a manifest into the blob store
    Ingest {
        /// Manifest file with one `<key> <location>` entry per line
        manifest: PathBuf,

        /// Issue a commit after this many bytes were read
        #[arg(long)]
        commit_threshold: Option<u64>,

        /// Files larger than this will be ignored
        #[arg(long)]
        ignore_above: Option<u64>,

        /// Truncate the blob store before commencing
        #[arg(long, default_value_t = false)]
        truncate: bool,
    },

    /// Truncate the blob store
    Truncate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment configuration wins; --verbose only raises the default level.
    let mut log_config = LogConfig::from_env()?;
    log_config.log_file_prefix = "drs-cli".to_string();
    if cli.verbose && std::env::var("LOG_LEVEL").is_err() {
        log_config.level = LogLevel::Debug;
    }

    init_logging(&log_config)?;

    let config = StoreConfig::load()?;
    let store = Store::connect(&config).await?;

    match cli.command {
        Command::Diagnostics { keys } => {
            commands::diagnostics::run(&store, &keys).await?;
        },
        Command::Kv => {
            commands::kv::run(&store).await?;
        },
        Command::Ingest { manifest, commit_threshold, ignore_above, truncate } => {
            commands::ingest::run(
                &store,
                &config,
                &manifest,
                commit_threshold,
                ignore_above,
                truncate,
            )
            .await?;
        },
        Command::Truncate => {
            commands::truncate::run(&store).await?;
        },
    }

    info!("Done");
    Ok(())
}
