//! Credential management commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{OutputFormat, print_formatted, print_success};
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum CredentialCommands {
    /// Validate and store new API credentials
    Set {
        /// API client ID
        client_id: String,

        /// API client secret
        client_secret: String,
    },

    /// Check whether the stored credentials are valid
    Check,
}

#[derive(Serialize)]
struct CredentialResult {
    saved: Option<bool>,
    is_valid: bool,
}

pub async fn run(
    command: CredentialCommands,
    session: &Session,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    match command {
        CredentialCommands::Set {
            client_id,
            client_secret,
        } => set(session, &client_id, &client_secret, format, quiet).await,
        CredentialCommands::Check => check(session, format).await,
    }
}

async fn set(
    session: &Session,
    client_id: &str,
    client_secret: &str,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    // The command stands in for the credentials dialog; a successful save closes it.
    session.credentials.open_credentials_modal();
    let saved = session.credentials.save(client_id, client_secret).await;
    if !saved {
        session.credentials.close_credentials_modal();
        anyhow::bail!("Credentials were rejected; nothing was saved");
    }

    let result = CredentialResult {
        saved: Some(saved),
        is_valid: session.credentials.is_valid(),
    };
    if format == OutputFormat::Json {
        print_formatted(&result, format, |_| String::new());
    } else {
        print_success("Credentials validated and saved.", quiet);
    }
    Ok(())
}

async fn check(session: &Session, format: OutputFormat) -> Result<()> {
    session.credentials.load().await;
    let result = CredentialResult {
        saved: None,
        is_valid: session.credentials.is_valid(),
    };

    print_formatted(&result, format, |r| {
        if r.is_valid {
            "Stored credentials are valid.".to_string()
        } else {
            "No valid credentials stored. Run 'spotwrap credentials set <ID> <SECRET>'.".to_string()
        }
    });

    Ok(())
}
