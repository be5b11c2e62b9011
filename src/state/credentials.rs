//! API credential state

use std::fmt;

use tokio::sync::watch;

use crate::backend::{BackendHandle, CLIENT_ID_KEY, CLIENT_SECRET_KEY};
use crate::state::StoreError;

/// Credential fields as shown to the user
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    pub client_id: String,
    pub client_secret: String,
    /// Only ever set from a backend answer
    pub is_valid: bool,
    /// Whether the credentials dialog is open
    pub show_credentials_modal: bool,
}

impl fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialState")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("is_valid", &self.is_valid)
            .field("show_credentials_modal", &self.show_credentials_modal)
            .finish()
    }
}

/// Owns the API credentials and their validity flag
pub struct CredentialStore {
    backend: BackendHandle,
    state: watch::Sender<CredentialState>,
}

impl CredentialStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            state: watch::channel(CredentialState::default()).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CredentialState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CredentialState {
        self.state.borrow().clone()
    }

    pub fn is_valid(&self) -> bool {
        self.state.borrow().is_valid
    }

    /// Load stored credentials, then probe them.
    ///
    /// If either field cannot be read, both are cleared and the credentials
    /// are marked invalid.
    pub async fn load(&self) {
        match self.fetch_stored().await {
            Ok((client_id, client_secret)) => {
                tracing::debug!(id_len = client_id.len(), "Loaded stored credentials");
                self.state.send_modify(|s| {
                    s.client_id = client_id;
                    s.client_secret = client_secret;
                });
                self.check_validity().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error loading credentials, clearing fields");
                self.state.send_modify(|s| {
                    s.client_id.clear();
                    s.client_secret.clear();
                    s.is_valid = false;
                });
            }
        }
    }

    async fn fetch_stored(&self) -> Result<(String, String), StoreError> {
        let client_id = self.backend.get_setting(CLIENT_ID_KEY).await?;
        let client_secret = self.backend.get_setting(CLIENT_SECRET_KEY).await?;
        Ok((
            client_id.unwrap_or_default(),
            client_secret.unwrap_or_default(),
        ))
    }

    /// Validate and store new credentials.
    ///
    /// The supplied values stay in the fields whatever the outcome, so a
    /// rejected value can be corrected. Returns whether the backend accepted
    /// them.
    pub async fn save(&self, client_id: &str, client_secret: &str) -> bool {
        self.state.send_modify(|s| {
            s.client_id = client_id.to_string();
            s.client_secret = client_secret.to_string();
        });

        let outcome = match self
            .backend
            .validate_and_store_credentials(client_id, client_secret)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::ValidationRejected),
            Err(e) => Err(StoreError::from(e)),
        };

        match outcome {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.is_valid = true;
                    s.show_credentials_modal = false;
                });
                tracing::info!("Credentials saved");
                // Re-confirm with the probe in case storing diverged from validation.
                self.check_validity().await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credentials not saved");
                self.state.send_modify(|s| s.is_valid = false);
                false
            }
        }
    }

    /// Ask the backend whether the stored credentials are valid
    pub async fn check_validity(&self) -> bool {
        let is_valid = match self.backend.has_valid_credentials().await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "Credential probe failed, treating as invalid");
                false
            }
        };
        self.state.send_modify(|s| s.is_valid = is_valid);
        is_valid
    }

    pub fn open_credentials_modal(&self) {
        self.state.send_modify(|s| s.show_credentials_modal = true);
    }

    pub fn close_credentials_modal(&self) {
        self.state.send_modify(|s| s.show_credentials_modal = false);
    }
}
