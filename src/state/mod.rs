//! Application state modules
//!
//! Each store owns its fields exclusively and publishes them through a
//! `watch` channel so the presentation layer can render the latest value.
//! Stores never read one another's state.

mod credentials;
mod download;
mod preferences;
mod update;

use thiserror::Error;

use crate::backend::BackendError;

pub use credentials::CredentialStore;
pub use download::{DownloadPhase, DownloadProgressMonitor};
pub use preferences::PreferenceStore;
#[cfg(test)]
pub use preferences::{APPEND_ARTIST_ALBUM_KEY, DOWNLOAD_PATH_KEY};
pub use update::{UpdateCheckCoordinator, UpdateCheckState};

/// Failures observed inside a store.
///
/// These are logged where they happen; no store method hands one back to
/// its caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Credentials were rejected")]
    ValidationRejected,

    #[error("Could not persist '{key}', reverted to last saved value: {source}")]
    PersistenceRollback {
        key: &'static str,
        #[source]
        source: BackendError,
    },
}
