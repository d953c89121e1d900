//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod config_cmd;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions, Settings};
use crate::http_client::HttpClient;
use crate::source::PageSource;
use crate::store::ArcGisStore;

#[derive(Parser)]
#[command(name = "casesync")]
#[command(about = "Sync published COVID-19 case counts into hosted feature layers")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check every poll interval and sync once per hour (default)
    Run,

    /// Run a single sync cycle and exit
    Once,

    /// Fetch and parse the source page without writing anything
    Check {
        /// Also reconcile against an in-memory store and show the decision
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective settings
    Config,
}

/// Build the page source and the remote store from settings.
fn build_clients(settings: &Settings) -> anyhow::Result<(PageSource, ArcGisStore)> {
    let client = HttpClient::new(settings.request_timeout(), &settings.user_agent)?;
    let source = PageSource::new(client.clone(), &settings.source_url)?;
    let store = ArcGisStore::new(client, settings.store_config())?;
    Ok((source, store))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let settings = load_settings_with_options(options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run::cmd_run(&settings).await,
        Commands::Once => run::cmd_once(&settings).await,
        Commands::Check { dry_run } => check::cmd_check(&settings, dry_run).await,
        Commands::Config => config_cmd::cmd_config_show(&settings),
    }
}
