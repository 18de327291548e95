mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use commands::Workspace;

#[derive(Parser)]
#[command(name = "globalcal")]
#[command(about = "Project dated records of any model into one calendar and keep it in sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Record store snapshot (defaults to <data_dir>/store.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Source registry (defaults to <data_dir>/sources.toml)
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured sources
    Sources,
    /// Reconcile projected events with their source records
    Sync {
        /// Only sync this source (by id); all active sources otherwise
        #[arg(short, long)]
        source: Option<u64>,
    },
    /// Create the default sources for every installed model
    Bootstrap,
    /// List projected events
    Events {
        /// Only list events of this source (by id)
        #[arg(short, long)]
        source: Option<u64>,
    },
    /// Write projected events to an .ics file
    Export {
        file: PathBuf,

        /// Only export events of this source (by id)
        #[arg(short, long)]
        source: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let workspace = Workspace::load(cli.store, cli.sources)?;

    match cli.command {
        Commands::Sources => commands::sources::run(&workspace),
        Commands::Sync { source } => commands::sync::run(workspace, source),
        Commands::Bootstrap => commands::bootstrap::run(workspace),
        Commands::Events { source } => {
            require_source(&workspace, source)?;
            commands::events::run(&workspace, source)
        }
        Commands::Export { file, source } => {
            require_source(&workspace, source)?;
            commands::export::run(&workspace, &file, source)
        }
    }
}

fn require_source(workspace: &Workspace, source: Option<u64>) -> Result<()> {
    let Some(id) = source else {
        return Ok(());
    };

    if workspace.registry.get(id).is_none() {
        let available: Vec<String> = workspace
            .registry
            .sources()
            .iter()
            .map(|s| s.id.to_string())
            .collect();
        anyhow::bail!(
            "Source {} not found. Available: {}",
            id,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        );
    }

    Ok(())
}
