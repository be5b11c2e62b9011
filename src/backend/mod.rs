//! Request/response seam to the backend process.
//!
//! Stores never talk to a `Backend` directly; they go through `BackendHandle`,
//! which puts a deadline on every call so a request that never resolves
//! surfaces as `BackendError::Timeout` instead of stalling its caller.

mod local;
#[cfg(test)]
pub mod memory;
mod progress;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use local::{CLIENT_ID_KEY, CLIENT_SECRET_KEY, LocalBackend};
pub use progress::{ProgressReceiver, progress_channel};

/// Errors produced by a backend call
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend call failed: {0}")]
    Call(String),

    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Wire shape of an update check.
///
/// `error` and the success fields are meant to be mutually exclusive, but
/// nothing in this shape enforces it. See `UpdateCheckResult` for the
/// normalized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    #[serde(default)]
    pub update_available: bool,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default, rename = "releaseURL")]
    pub release_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateInfo {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Operations the backend exposes to the client layer
pub trait Backend: Send + Sync + 'static {
    /// Read a keyed setting; `None` when it was never stored
    fn get_setting(&self, key: &str) -> BoxFuture<'static, BackendResult<Option<String>>>;

    /// Store a keyed setting
    fn set_setting(&self, key: &str, value: &str) -> BoxFuture<'static, BackendResult<()>>;

    /// Validate the credentials and, if accepted, persist them
    fn validate_and_store_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> BoxFuture<'static, BackendResult<bool>>;

    /// Check whether the stored credentials are currently valid
    fn has_valid_credentials(&self) -> BoxFuture<'static, BackendResult<bool>>;

    /// Compare the running version against the latest published release
    fn check_for_updates(&self) -> BoxFuture<'static, BackendResult<UpdateInfo>>;
}

/// Shared, deadline-enforcing handle to a backend
#[derive(Clone)]
pub struct BackendHandle {
    inner: Arc<dyn Backend>,
    timeout: Duration,
}

impl BackendHandle {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self {
            inner: backend,
            timeout,
        }
    }

    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = BackendResult<T>>,
    ) -> BackendResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout = ?self.timeout, "Backend call timed out");
                Err(BackendError::Timeout(self.timeout))
            }
        }
    }

    pub async fn get_setting(&self, key: &str) -> BackendResult<Option<String>> {
        self.call("get_setting", self.inner.get_setting(key)).await
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> BackendResult<()> {
        self.call("set_setting", self.inner.set_setting(key, value))
            .await
    }

    pub async fn validate_and_store_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> BackendResult<bool> {
        self.call(
            "validate_and_store_credentials",
            self.inner
                .validate_and_store_credentials(client_id, client_secret),
        )
        .await
    }

    pub async fn has_valid_credentials(&self) -> BackendResult<bool> {
        self.call("has_valid_credentials", self.inner.has_valid_credentials())
            .await
    }

    pub async fn check_for_updates(&self) -> BackendResult<UpdateInfo> {
        self.call("check_for_updates", self.inner.check_for_updates())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryBackend;
    use super::*;

    #[tokio::test]
    async fn test_stalled_call_times_out() {
        let backend = InMemoryBackend::new();
        backend.stall_reads(true);
        let handle = BackendHandle::new(Arc::new(backend), Duration::from_millis(50));

        let err = handle.get_setting("anything").await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_call_passes_through_result() {
        let backend = InMemoryBackend::new();
        backend.insert_setting("lastDownloadPath", "/music");
        let handle = BackendHandle::new(Arc::new(backend), Duration::from_secs(2));

        assert_eq!(
            handle.get_setting("lastDownloadPath").await.unwrap().as_deref(),
            Some("/music")
        );
        assert_eq!(handle.get_setting("missing").await.unwrap(), None);
    }

    #[test]
    fn test_update_info_wire_names() {
        let info: UpdateInfo = serde_json::from_str(
            r#"{"updateAvailable": true, "latestVersion": "2.0", "releaseURL": "https://x"}"#,
        )
        .unwrap();
        assert!(info.update_available);
        assert_eq!(info.latest_version, "2.0");
        assert_eq!(info.release_url, "https://x");
        assert_eq!(info.error, None);

        let json = serde_json::to_value(UpdateInfo::failed("boom")).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["updateAvailable"], false);
    }
}
