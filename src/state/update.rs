//! Update-availability state

use serde::Serialize;
use tokio::sync::watch;

use crate::backend::{BackendHandle, UpdateInfo};

/// Shown when the check itself could not be carried out
const GENERIC_CHECK_ERROR: &str = "Could not check for updates";

/// Outcome of one update check. Exactly one variant holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateCheckResult {
    Checked {
        available: bool,
        latest_version: String,
        release_url: String,
    },
    Failed {
        error: String,
    },
}

impl From<UpdateInfo> for UpdateCheckResult {
    fn from(info: UpdateInfo) -> Self {
        match info.error {
            Some(error) if !error.is_empty() => Self::Failed { error },
            _ => Self::Checked {
                available: info.update_available,
                latest_version: info.latest_version,
                release_url: info.release_url,
            },
        }
    }
}

/// Update state as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateCheckState {
    /// `None` until the first check finishes
    pub result: Option<UpdateCheckResult>,
    /// Whether the update dialog is visible
    pub show_dialog: bool,
}

impl UpdateCheckState {
    pub fn available(&self) -> bool {
        matches!(
            self.result,
            Some(UpdateCheckResult::Checked {
                available: true,
                ..
            })
        )
    }

    /// Error text of the last check, empty if it succeeded
    pub fn error(&self) -> &str {
        match &self.result {
            Some(UpdateCheckResult::Failed { error }) => error,
            _ => "",
        }
    }

    pub fn latest_version(&self) -> &str {
        match &self.result {
            Some(UpdateCheckResult::Checked { latest_version, .. }) => latest_version,
            _ => "",
        }
    }

    pub fn release_url(&self) -> &str {
        match &self.result {
            Some(UpdateCheckResult::Checked { release_url, .. }) => release_url,
            _ => "",
        }
    }
}

/// Owns update availability and the update dialog's visibility
pub struct UpdateCheckCoordinator {
    backend: BackendHandle,
    state: watch::Sender<UpdateCheckState>,
}

impl UpdateCheckCoordinator {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            state: watch::channel(UpdateCheckState::default()).0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateCheckState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UpdateCheckState {
        self.state.borrow().clone()
    }

    /// Ask the backend for the latest version.
    ///
    /// An available update opens the dialog; anything else closes it.
    pub async fn check(&self) -> UpdateCheckState {
        let result = match self.backend.check_for_updates().await {
            Ok(info) => UpdateCheckResult::from(info),
            Err(e) => {
                tracing::warn!(error = %e, "Update check call failed");
                UpdateCheckResult::Failed {
                    error: GENERIC_CHECK_ERROR.to_string(),
                }
            }
        };

        match &result {
            UpdateCheckResult::Failed { error } => {
                tracing::warn!(error = %error, "Update check reported an error");
            }
            UpdateCheckResult::Checked {
                available: true,
                latest_version,
                ..
            } => {
                tracing::info!(version = %latest_version, "Update available");
            }
            UpdateCheckResult::Checked { .. } => {
                tracing::debug!("No update available");
            }
        }

        let show_dialog = matches!(
            result,
            UpdateCheckResult::Checked {
                available: true,
                ..
            }
        );
        self.state.send_modify(|s| {
            s.result = Some(result);
            s.show_dialog = show_dialog;
        });
        self.snapshot()
    }

    /// Close the dialog at the user's request
    pub fn dismiss(&self) {
        self.state.send_modify(|s| s.show_dialog = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn coordinator(backend: &Arc<InMemoryBackend>) -> UpdateCheckCoordinator {
        UpdateCheckCoordinator::new(BackendHandle::new(backend.clone(), Duration::from_secs(1)))
    }

    fn available(version: &str, url: &str) -> UpdateInfo {
        UpdateInfo {
            update_available: true,
            latest_version: version.to_string(),
            release_url: url.to_string(),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_available_update_opens_dialog() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(available("2.0", "https://x")));
        let coordinator = coordinator(&backend);

        let state = coordinator.check().await;

        assert!(state.available());
        assert!(state.show_dialog);
        assert_eq!(state.error(), "");
        assert_eq!(state.latest_version(), "2.0");
        assert_eq!(state.release_url(), "https://x");
    }

    #[tokio::test]
    async fn test_no_update_closes_dialog() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(available("2.0", "https://x")));
        let coordinator = coordinator(&backend);
        coordinator.check().await;

        backend.respond_to_update_check(Ok(UpdateInfo {
            latest_version: "1.0.0".into(),
            ..Default::default()
        }));
        let state = coordinator.check().await;

        assert!(!state.available());
        assert!(!state.show_dialog);
        assert_eq!(state.error(), "");
    }

    #[tokio::test]
    async fn test_reported_error_clears_availability() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(available("2.0", "https://x")));
        let coordinator = coordinator(&backend);
        coordinator.check().await;

        backend.respond_to_update_check(Ok(UpdateInfo::failed("Could not compare versions")));
        let state = coordinator.check().await;

        assert!(!state.available());
        assert!(!state.show_dialog);
        assert_eq!(state.error(), "Could not compare versions");
        assert_eq!(state.latest_version(), "");
    }

    #[tokio::test]
    async fn test_error_wins_over_success_fields() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(UpdateInfo {
            error: Some("rate limited".into()),
            ..available("2.0", "https://x")
        }));
        let coordinator = coordinator(&backend);

        let state = coordinator.check().await;

        assert!(!state.available());
        assert!(!state.show_dialog);
        assert_eq!(
            state.result,
            Some(UpdateCheckResult::Failed {
                error: "rate limited".into()
            })
        );
    }

    #[tokio::test]
    async fn test_transport_failure_uses_generic_error() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Err("connection refused".into()));
        let coordinator = coordinator(&backend);

        let state = coordinator.check().await;

        assert!(!state.available());
        assert!(!state.show_dialog);
        assert_eq!(state.error(), GENERIC_CHECK_ERROR);
    }

    #[tokio::test]
    async fn test_dismissed_dialog_stays_closed_until_next_check() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(available("2.0", "https://x")));
        let coordinator = coordinator(&backend);

        coordinator.check().await;
        coordinator.dismiss();
        let state = coordinator.snapshot();
        assert!(state.available());
        assert!(!state.show_dialog);
    }

    #[tokio::test]
    async fn test_subscriber_sees_check_and_dismiss() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.respond_to_update_check(Ok(available("2.0", "https://x")));
        let coordinator = coordinator(&backend);
        let mut rx = coordinator.subscribe();
        assert_eq!(rx.borrow_and_update().result, None);

        coordinator.check().await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().show_dialog);

        coordinator.dismiss();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(!state.show_dialog);
        assert_eq!(state.latest_version(), "2.0");
    }

    #[test]
    fn test_empty_error_string_is_success() {
        let result = UpdateCheckResult::from(UpdateInfo {
            error: Some(String::new()),
            ..available("2.0", "https://x")
        });
        assert!(matches!(result, UpdateCheckResult::Checked { available: true, .. }));
    }
}
