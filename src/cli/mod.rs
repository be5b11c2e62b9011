//! CLI module for Spotwrap
//!
//! Drives an application session from the command line.

mod commands;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::backend::{BackendHandle, LocalBackend};
use crate::config::Config;
use crate::db::Database;
use crate::github::GitHubClient;
use crate::session::Session;

pub use output::{OutputFormat, print_error};

/// Spotwrap - settings and download status from the command line
#[derive(Parser, Debug)]
#[command(name = "spotwrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[command(flatten)]
    pub output: OutputOptions,

    /// Do not contact the network (credential checks and update checks fail fast)
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output formatting options
#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// Output in JSON format (for machine parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl OutputOptions {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a session and show every store
    Status,

    /// API credential management
    Credentials {
        #[command(subcommand)]
        command: commands::credentials::CredentialCommands,
    },

    /// Download preferences
    Prefs {
        #[command(subcommand)]
        command: commands::prefs::PrefsCommands,
    },

    /// Application update checks
    Update {
        #[command(subcommand)]
        command: commands::update::UpdateCommands,
    },

    /// Follow download progress messages read from stdin
    Monitor,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

/// Build a session backed by the local settings database
fn open_session(config: &Config, offline: bool) -> Result<Session> {
    let db_path = match &config.database.path {
        Some(path) => path.into(),
        None => Database::db_path()?,
    };
    let db = Database::open(&db_path)?;
    let backend = LocalBackend::new(db, GitHubClient::new()?, config.updates.clone(), offline);

    Ok(Session::new(BackendHandle::new(
        Arc::new(backend),
        config.backend.timeout(),
    )))
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let format = cli.output.format();
    let quiet = cli.output.quiet;

    let offline = cli.offline;
    let session = || open_session(&config, offline);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => commands::status::run(&session()?, format).await,
        Commands::Credentials { command } => {
            commands::credentials::run(command, &session()?, format, quiet).await
        }
        Commands::Prefs { command } => {
            commands::prefs::run(command, &session()?, format, quiet).await
        }
        Commands::Update { command } => {
            commands::update::run(command, &session()?, format, quiet).await
        }
        Commands::Monitor => commands::monitor::run(&session()?, format, quiet).await,
        Commands::Config { command } => commands::config::run(command, &config, format).await,
    }
}
