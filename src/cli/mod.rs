//! CLI parser and dispatch.

mod categories;
mod scrape;
mod sources_cmd;
mod state;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "axles")]
#[command(about = "Axles marketplace listing ingestion")]
#[command(version)]
pub struct Cli {
    /// Sources TOML file (default: sources.toml)
    #[arg(short, long, global = true, env = "AXLES_SOURCES")]
    sources: Option<PathBuf>,

    /// Data directory for checkpoint state
    #[arg(long, global = true, env = "AXLES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl one or more sources and import their listings
    Scrape {
        /// Source ids to crawl (see `axles sources`)
        source_ids: Vec<String>,
        /// Crawl all configured sources
        #[arg(short, long)]
        all: bool,
        /// Stop after importing this many listings per source (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: u64,
        /// Start from this page instead of the source's first page
        #[arg(long)]
        start_page: Option<u32>,
        /// Override the politeness delay between requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Import into an in-memory catalog instead of the hosted store
        #[arg(long)]
        dry_run: bool,
    },

    /// Show crawl progress per source
    Status {
        /// Source id (optional, shows all if not specified)
        source_id: Option<String>,
    },

    /// List configured sources
    Sources,

    /// Print the category keyword taxonomy
    Categories,

    /// Manage crawl state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// Clear crawl state for a source
    Clear {
        /// Source id
        source_id: String,
        /// Confirm clearing
        #[arg(long)]
        confirm: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.sources, cli.data_dir);

    match cli.command {
        Commands::Scrape {
            source_ids,
            all,
            limit,
            start_page,
            delay_ms,
            dry_run,
        } => {
            scrape::cmd_scrape(
                &settings,
                &source_ids,
                all,
                limit,
                start_page,
                delay_ms,
                dry_run,
            )
            .await
        }
        Commands::Status { source_id } => status::cmd_status(&settings, source_id.as_deref()).await,
        Commands::Sources => sources_cmd::cmd_sources(&settings).await,
        Commands::Categories => categories::cmd_categories().await,
        Commands::State { command } => match command {
            StateCommands::Clear { source_id, confirm } => {
                state::cmd_state_clear(&settings, &source_id, confirm).await
            }
        },
    }
}
