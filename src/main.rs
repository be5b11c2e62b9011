mod backend;
mod cli;
mod config;
mod db;
mod github;
mod session;
mod spotify;
mod state;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;

/// Default log filter when neither RUST_LOG nor the config sets one
const DEFAULT_FILTER: &str = "spotwrap=info,warn";

fn log_filter(config: &Config, verbose: bool) -> String {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return filter;
    }
    if let Some(filter) = &config.logging.filter {
        return filter.clone();
    }
    if verbose {
        "spotwrap=debug,info".to_string()
    } else {
        DEFAULT_FILTER.to_string()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter(
            &config,
            cli.output.verbose,
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Reported here since logging depends on the loaded config
    match (config_error, Config::config_path()) {
        (Some(e), _) => tracing::warn!("Failed to load config, using defaults: {}", e),
        (None, Ok(path)) if path.exists() => {
            tracing::info!("Loaded configuration from {:?}", path)
        }
        (None, _) => tracing::info!("No configuration file found, using defaults"),
    }

    tracing::info!("Starting Spotwrap {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli::run(cli, config).await {
        cli::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
