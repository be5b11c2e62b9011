//! Update check commands

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::{OutputFormat, print_formatted, print_success};
use crate::session::Session;
use crate::state::UpdateCheckState;

#[derive(Subcommand, Debug)]
pub enum UpdateCommands {
    /// Check for a newer release
    Check,

    /// Check, and open the release page if an update is available
    Open,
}

pub async fn run(command: UpdateCommands, session: &Session, format: OutputFormat, quiet: bool) -> Result<()> {
    let state = session.updates.check().await;
    print_formatted(&state, format, format_check);

    if !state.error().is_empty() {
        anyhow::bail!("Update check failed: {}", state.error());
    }

    if let UpdateCommands::Open = command {
        if state.available() {
            open::that(state.release_url())?;
            session.updates.dismiss();
            print_success(&format!("Opened {}", state.release_url()), quiet);
        } else {
            print_success("Nothing to open.", quiet);
        }
    }

    Ok(())
}

fn format_check(state: &UpdateCheckState) -> String {
    if !state.error().is_empty() {
        format!("Update check failed: {}", state.error())
    } else if state.available() {
        format!(
            "Version {} is available.\nRelease: {}\n\nRun 'spotwrap update open' to view it.",
            state.latest_version(),
            state.release_url()
        )
    } else {
        format!(
            "You are running the latest version ({}).",
            env!("CARGO_PKG_VERSION")
        )
    }
}
