//! imgsync - publish image folders through a git remote and list their CDN URLs.
//!
//! Loads `.config/settings.toml` (created with defaults on first run), sets
//! up application logging under the configured logs folder, then dispatches
//! to one subcommand.

mod commands;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use imgsync_core::config::ConfigManager;
use imgsync_core::logging::{init_tracing_with_file, LogLevel};

use crate::commands::upload::UploadArgs;

#[derive(Parser)]
#[command(name = "imgsync", version)]
#[command(about = "Publish image folders to a git repository in batches and list their CDN URLs")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = ".config/settings.toml")]
    config: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prepare the working tree: init, identity, ignore list, remote and branch
    Init,
    /// Copy folders into the working tree, push them in batches and write URL manifests
    Upload {
        /// Folders to publish, in order
        #[arg(required = true)]
        folders: Vec<PathBuf>,
        /// Images per commit/push cycle (overrides the config)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Fail the job when a folder contains no images
        #[arg(long)]
        strict: bool,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Commit everything, then delete untracked files except the configured excludes
    Clean {
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Remove a stale index lock and reset the staging area
    Unlock,
    /// Show repository readiness and the last job report
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    if let Err(e) = config.load_or_create() {
        eprintln!("warning: failed to load config: {e}. Using defaults.");
    }

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config.settings().logging.level
    };
    let _log_guard = init_tracing_with_file(level, &config.logs_folder());

    tracing::info!("imgsync {} starting", imgsync_core::version());
    tracing::debug!("Config: {}", cli.config.display());

    if let Err(e) = config.ensure_dirs_exist() {
        tracing::error!("Failed to create directories: {}", e);
        eprintln!("warning: failed to create directories: {e}");
    }

    match cli.command {
        Command::Init => commands::init::run(&config).map(|()| ExitCode::SUCCESS),
        Command::Upload {
            folders,
            batch_size,
            strict,
            yes,
        } => {
            let args = UploadArgs {
                folders,
                batch_size,
                strict,
                yes,
            };
            commands::upload::run(&config, args).await
        }
        Command::Clean { yes } => commands::maintenance::clean(&config, yes),
        Command::Unlock => commands::maintenance::unlock(&config).map(|()| ExitCode::SUCCESS),
        Command::Status => commands::status::run(&config).map(|()| ExitCode::SUCCESS),
    }
}
