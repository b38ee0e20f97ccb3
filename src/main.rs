//! # Ad Scout CLI (`ads`)
//!
//! The `ads` binary finds advertisement videos similar to a source video,
//! using embedding vectors stored in a Pinecone index. It provides commands
//! for running a search, checking index health, and starting the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! ads --config ./config/adscout.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ads search <video-id>` | Find ads similar to a source video |
//! | `ads status` | Show vector index statistics |
//! | `ads serve` | Start the HTTP search server |
//!
//! ## Examples
//!
//! ```bash
//! # Check that the configured index is reachable and populated
//! ads status --config ./config/adscout.toml
//!
//! # Find ads similar to a source video
//! ads search 66fcc28b523f827c6044493d --config ./config/adscout.toml
//!
//! # Serve the search API for the web frontend
//! ads serve --config ./config/adscout.toml
//! ```

mod config;
mod index;
mod models;
mod pinecone;
mod search;
mod server;
mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ad Scout CLI: find advertisement videos similar to a source video.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/adscout.example.toml` for a full example. The Pinecone
/// API key is read from the `PINECONE_API_KEY` environment variable.
#[derive(Parser)]
#[command(
    name = "ads",
    about = "Ad Scout: find advertisement videos similar to a source video",
    version,
    long_about = "Ad Scout recovers a source video's stored embedding vectors at clip and \
    whole-video granularity, queries a Pinecone index for nearby advertisement videos at each \
    granularity, and merges both result sets into a single ranked, deduplicated list."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/adscout.toml`. Index, search, and server
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/adscout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Find advertisement videos similar to a source video.
    ///
    /// Recovers the video's stored clip and whole-video embeddings, runs a
    /// nearest-neighbor query against advertisement vectors at each
    /// granularity, and prints one deduplicated, score-ranked list.
    Search {
        /// Source video identifier, as stored in the index metadata.
        video_id: String,
    },

    /// Show vector index statistics.
    ///
    /// Prints dimension, vector counts, and fullness for the configured
    /// index. Useful for verifying connectivity and configuration before
    /// searching.
    Status,

    /// Start the HTTP search server.
    ///
    /// Binds to the address configured in `[server].bind` and exposes
    /// `POST /search`, `GET /stats`, and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search { video_id } => {
            search::run_search(&cfg, &video_id).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
