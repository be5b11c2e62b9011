//! In-process backend: SQLite settings, GitHub release checks and
//! token-endpoint credential validation.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use super::{Backend, BackendError, BackendResult, UpdateInfo};
use crate::config::UpdateConfig;
use crate::db::Database;
use crate::github::{self, GitHubClient};
use crate::spotify;

pub const CLIENT_ID_KEY: &str = "spotify_client_id";
pub const CLIENT_SECRET_KEY: &str = "spotify_client_secret";

/// Backend that runs inside the client process
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Database>>,
    github: GitHubClient,
    updates: UpdateConfig,
    current_version: String,
    /// Refuse network-backed operations
    offline: bool,
}

impl LocalBackend {
    pub fn new(db: Database, github: GitHubClient, updates: UpdateConfig, offline: bool) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            github,
            updates,
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            offline,
        }
    }

    /// Run a closure against the database on the blocking pool
    fn with_db<T, F>(&self, f: F) -> BoxFuture<'static, BackendResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> rusqlite::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let mut guard = db
                    .lock()
                    .map_err(|e| BackendError::Unavailable(format!("settings lock poisoned: {}", e)))?;
                f(&mut *guard).map_err(BackendError::from)
            })
            .await
            .map_err(|e| BackendError::Unavailable(format!("settings task failed: {}", e)))?
        })
    }

    fn offline_error(op: &str) -> BackendError {
        BackendError::Call(format!("{} requires network access (offline mode)", op))
    }
}

impl Backend for LocalBackend {
    fn get_setting(&self, key: &str) -> BoxFuture<'static, BackendResult<Option<String>>> {
        let key = key.to_string();
        self.with_db(move |db| db.get_setting(&key))
    }

    fn set_setting(&self, key: &str, value: &str) -> BoxFuture<'static, BackendResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_db(move |db| db.set_setting(&key, &value))
    }

    fn validate_and_store_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> BoxFuture<'static, BackendResult<bool>> {
        let this = self.clone();
        let client_id = client_id.to_string();
        let client_secret = client_secret.to_string();

        Box::pin(async move {
            if this.offline {
                return Err(Self::offline_error("credential validation"));
            }

            let accepted =
                spotify::credentials_accepted(this.github.client(), &client_id, &client_secret)
                    .await
                    .map_err(|e| BackendError::Call(e.to_string()))?;
            if !accepted {
                tracing::info!("Credential validation failed; nothing stored");
                return Ok(false);
            }

            this.with_db(move |db| {
                db.set_settings(&[
                    (CLIENT_ID_KEY, client_id.as_str()),
                    (CLIENT_SECRET_KEY, client_secret.as_str()),
                ])
            })
            .await?;

            tracing::info!("Credentials validated and stored");
            Ok(true)
        })
    }

    fn has_valid_credentials(&self) -> BoxFuture<'static, BackendResult<bool>> {
        let this = self.clone();

        Box::pin(async move {
            let (client_id, client_secret) = this
                .with_db(|db| {
                    Ok((
                        db.get_setting(CLIENT_ID_KEY)?.unwrap_or_default(),
                        db.get_setting(CLIENT_SECRET_KEY)?.unwrap_or_default(),
                    ))
                })
                .await?;

            if client_id.is_empty() || client_secret.is_empty() {
                return Ok(false);
            }
            if this.offline {
                return Err(Self::offline_error("credential probe"));
            }

            spotify::credentials_accepted(this.github.client(), &client_id, &client_secret)
                .await
                .map_err(|e| BackendError::Call(e.to_string()))
        })
    }

    fn check_for_updates(&self) -> BoxFuture<'static, BackendResult<UpdateInfo>> {
        let this = self.clone();

        Box::pin(async move {
            if this.offline {
                return Err(Self::offline_error("update check"));
            }

            let release = match this
                .github
                .latest_release(&this.updates.owner, &this.updates.repo)
                .await
            {
                Ok(release) => release,
                Err(e) => {
                    tracing::warn!("Error fetching latest release info: {}", e);
                    return Ok(UpdateInfo::failed(format!(
                        "Could not fetch latest release details: {}",
                        e
                    )));
                }
            };

            let newer = match github::is_newer_version(&this.current_version, &release.tag_name) {
                Ok(newer) => newer,
                Err(e) => {
                    tracing::warn!("Error comparing versions: {}", e);
                    return Ok(UpdateInfo::failed(format!("Could not compare versions: {}", e)));
                }
            };

            tracing::info!(
                current = %this.current_version,
                latest = %release.tag_name,
                newer,
                "Update check complete"
            );

            Ok(UpdateInfo {
                update_available: newer,
                latest_version: release.tag_name,
                release_url: release.html_url,
                error: None,
            })
        })
    }
}
