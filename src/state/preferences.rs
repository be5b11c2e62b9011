//! Persisted scalar preferences

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::backend::{BackendError, BackendHandle};
use crate::state::StoreError;

pub const DOWNLOAD_PATH_KEY: &str = "lastDownloadPath";
pub const APPEND_ARTIST_ALBUM_KEY: &str = "appendArtistAlbumToPath";

/// A value that can be stored as a keyed setting
pub trait PreferenceValue: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Decode a stored value; `None` yields the type's default
    fn decode(raw: Option<String>) -> Self;

    fn encode(&self) -> String;
}

impl PreferenceValue for String {
    fn decode(raw: Option<String>) -> Self {
        raw.unwrap_or_default()
    }

    fn encode(&self) -> String {
        self.clone()
    }
}

impl PreferenceValue for bool {
    fn decode(raw: Option<String>) -> Self {
        raw.as_deref() == Some("true")
    }

    fn encode(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }
}

/// Bookkeeping for rollback
struct Confirmed<T> {
    /// Last value the backend acknowledged
    last_known_good: T,
    /// Bumped by every write request; only the newest may roll back
    generation: u64,
}

/// One persisted preference.
///
/// Writes to the same key are serialized through `write_gate` and reach the
/// backend in the order they were requested. A failed write reverts the
/// displayed value to `last_known_good` only if no newer write has been
/// requested since; otherwise the newer write decides.
pub struct Preference<T> {
    key: &'static str,
    backend: BackendHandle,
    value: watch::Sender<T>,
    confirmed: Mutex<Confirmed<T>>,
    write_gate: tokio::sync::Mutex<()>,
}

impl<T: PreferenceValue> Preference<T> {
    pub fn new(key: &'static str, backend: BackendHandle) -> Self {
        let initial = T::decode(None);
        Self {
            key,
            backend,
            value: watch::channel(initial.clone()).0,
            confirmed: Mutex::new(Confirmed {
                last_known_good: initial,
                generation: 0,
            }),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }

    fn confirmed(&self) -> MutexGuard<'_, Confirmed<T>> {
        self.confirmed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, new: T) {
        self.value.send_if_modified(|current| {
            if *current == new {
                false
            } else {
                *current = new;
                true
            }
        });
    }

    /// Fetch the stored value. A missing or unreadable value becomes the default.
    pub async fn load(&self) {
        let _gate = self.write_gate.lock().await;

        let value = match self.backend.get_setting(self.key).await {
            Ok(raw) => T::decode(raw),
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "Error loading preference, using default");
                T::decode(None)
            }
        };
        tracing::debug!(key = self.key, value = ?value, "Loaded preference");

        let mut confirmed = self.confirmed();
        confirmed.last_known_good = value.clone();
        self.publish(value);
    }

    /// Persist `new` and show it only once the backend accepted it.
    ///
    /// A write that times out has an unknown outcome, so the stored value is
    /// read back and shown instead. Returns whether `new` ended up stored.
    pub async fn set(&self, new: T) -> bool {
        let generation = {
            let mut confirmed = self.confirmed();
            confirmed.generation += 1;
            confirmed.generation
        };
        self.write(generation, new).await
    }

    async fn write(&self, generation: u64, new: T) -> bool {
        let _gate = self.write_gate.lock().await;
        let result = match self.backend.set_setting(self.key, &new.encode()).await {
            Ok(()) => Ok(new.clone()),
            Err(BackendError::Timeout(limit)) => {
                tracing::warn!(key = self.key, ?limit, "Preference write timed out, re-reading stored value");
                self.backend.get_setting(self.key).await.map(T::decode)
            }
            Err(e) => Err(e),
        };

        let mut confirmed = self.confirmed();
        let newest = confirmed.generation == generation;
        match result {
            Ok(stored) => {
                let accepted = stored == new;
                if !accepted {
                    tracing::warn!(key = self.key, stored = ?stored, "Write not confirmed, showing stored value");
                }
                confirmed.last_known_good = stored.clone();
                if newest {
                    self.publish(stored);
                }
                accepted
            }
            Err(source) => {
                let err = if newest {
                    self.publish(confirmed.last_known_good.clone());
                    StoreError::PersistenceRollback {
                        key: self.key,
                        source,
                    }
                } else {
                    StoreError::Backend(source)
                };
                tracing::warn!(key = self.key, superseded = !newest, error = %err, "Error saving preference");
                false
            }
        }
    }
}

impl Preference<bool> {
    /// Flip the value immediately, then persist it.
    ///
    /// Returns the value shown once this write has settled.
    pub async fn toggle(&self) -> bool {
        let (generation, flipped) = {
            let mut confirmed = self.confirmed();
            confirmed.generation += 1;
            let flipped = !*self.value.borrow();
            self.publish(flipped);
            (confirmed.generation, flipped)
        };
        self.write(generation, flipped).await;
        self.get()
    }
}

/// Owns the user's persisted preferences
pub struct PreferenceStore {
    download_path: Preference<String>,
    append_artist_album: Preference<bool>,
}

impl PreferenceStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            download_path: Preference::new(DOWNLOAD_PATH_KEY, backend.clone()),
            append_artist_album: Preference::new(APPEND_ARTIST_ALBUM_KEY, backend),
        }
    }

    pub fn download_path(&self) -> &Preference<String> {
        &self.download_path
    }

    pub fn append_artist_album(&self) -> &Preference<bool> {
        &self.append_artist_album
    }

    pub async fn load_download_path(&self) {
        self.download_path.load().await;
    }

    pub async fn set_download_path(&self, path: impl Into<String>) -> bool {
        self.download_path.set(path.into()).await
    }

    pub async fn load_append_artist_album(&self) {
        self.append_artist_album.load().await;
    }

    pub async fn toggle_append_artist_album(&self) -> bool {
        self.append_artist_album.toggle().await
    }
}
