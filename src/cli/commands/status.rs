//! Session status command

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{OutputFormat, or_unset, print_formatted, status_line};
use crate::session::{InitReport, Session};
use crate::state::UpdateCheckState;

#[derive(Serialize)]
struct CredentialSummary {
    client_id: String,
    has_secret: bool,
    is_valid: bool,
}

#[derive(Serialize)]
struct StatusResult {
    init: InitReport,
    credentials: CredentialSummary,
    download_path: String,
    append_artist_album: bool,
    update: UpdateCheckState,
}

pub async fn run(session: &Session, format: OutputFormat) -> Result<()> {
    let init = session.initialize().await;
    let credentials = session.credentials.snapshot();

    let result = StatusResult {
        init,
        credentials: CredentialSummary {
            client_id: credentials.client_id.clone(),
            has_secret: !credentials.client_secret.is_empty(),
            is_valid: credentials.is_valid,
        },
        download_path: session.preferences.download_path().get(),
        append_artist_album: session.preferences.append_artist_album().get(),
        update: session.updates.snapshot(),
    };

    print_formatted(&result, format, format_status);
    Ok(())
}

fn format_status(r: &StatusResult) -> String {
    let mut lines = Vec::new();

    for step in &r.init.steps {
        lines.push(status_line(step.completed, step.step.description()));
    }
    lines.push(String::new());

    lines.push(format!("Client ID:          {}", or_unset(&r.credentials.client_id)));
    lines.push(format!(
        "Client secret:      {}",
        if r.credentials.has_secret { "<stored>" } else { "<not set>" }
    ));
    lines.push(status_line(r.credentials.is_valid, "Credentials valid"));
    lines.push(format!("Download path:      {}", or_unset(&r.download_path)));
    lines.push(format!("Artist/album dirs:  {}", r.append_artist_album));

    if !r.update.error().is_empty() {
        lines.push(format!("Update check:       failed ({})", r.update.error()));
    } else if r.update.available() {
        lines.push(format!(
            "Update check:       {} available at {}",
            r.update.latest_version(),
            r.update.release_url()
        ));
    } else {
        lines.push("Update check:       up to date".to_string());
    }

    lines.join("\n")
}
