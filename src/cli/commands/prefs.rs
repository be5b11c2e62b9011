//! Download preference commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{OutputFormat, or_unset, print_formatted, print_success};
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Show current preferences
    Show,

    /// Set the download directory
    SetPath {
        /// Directory downloads are saved to
        path: String,
    },

    /// Toggle saving into artist/album subdirectories
    ToggleAppend,
}

#[derive(Serialize)]
struct PrefsResult {
    download_path: String,
    append_artist_album: bool,
}

pub async fn run(command: PrefsCommands, session: &Session, format: OutputFormat, quiet: bool) -> Result<()> {
    let prefs = &session.preferences;
    prefs.load_download_path().await;
    prefs.load_append_artist_album().await;

    match command {
        PrefsCommands::Show => {}
        PrefsCommands::SetPath { path } => {
            if !prefs.set_download_path(path.as_str()).await {
                anyhow::bail!("Could not save download path");
            }
            print_success(&format!("Download path set to {}", path), quiet || format == OutputFormat::Json);
        }
        PrefsCommands::ToggleAppend => {
            let before = prefs.append_artist_album().get();
            let after = prefs.toggle_append_artist_album().await;
            if after == before {
                anyhow::bail!("Could not save preference; kept previous value ({})", before);
            }
            print_success(
                &format!("Artist/album subdirectories {}", if after { "enabled" } else { "disabled" }),
                quiet || format == OutputFormat::Json,
            );
        }
    }

    let result = PrefsResult {
        download_path: prefs.download_path().get(),
        append_artist_album: prefs.append_artist_album().get(),
    };
    if format == OutputFormat::Json || !quiet {
        print_formatted(&result, format, |r| {
            format!(
                "Download path:      {}\nArtist/album dirs:  {}",
                or_unset(&r.download_path),
                r.append_artist_album
            )
        });
    }

    Ok(())
}
