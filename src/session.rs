//! Application session: one instance of every store plus startup sequencing.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::backend::{BackendHandle, ProgressReceiver};
use crate::state::{CredentialStore, DownloadProgressMonitor, PreferenceStore, UpdateCheckCoordinator};

/// Steps run by `Session::initialize`, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStep {
    Credentials,
    DownloadPath,
    AppendArtistAlbum,
    UpdateCheck,
}

impl InitStep {
    pub fn description(&self) -> &'static str {
        match self {
            InitStep::Credentials => "Load credentials",
            InitStep::DownloadPath => "Load download path",
            InitStep::AppendArtistAlbum => "Load artist/album folder preference",
            InitStep::UpdateCheck => "Check for updates",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: InitStep,
    /// False if the step panicked
    pub completed: bool,
}

/// What happened during startup
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub steps: Vec<StepOutcome>,
}

impl InitReport {
    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|s| s.completed)
    }
}

/// Holds the stores for one application session
pub struct Session {
    pub credentials: CredentialStore,
    pub preferences: PreferenceStore,
    pub updates: UpdateCheckCoordinator,
    pub downloads: Arc<DownloadProgressMonitor>,
}

impl Session {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            credentials: CredentialStore::new(backend.clone()),
            preferences: PreferenceStore::new(backend.clone()),
            updates: UpdateCheckCoordinator::new(backend),
            downloads: Arc::new(DownloadProgressMonitor::new()),
        }
    }

    /// Load every settings domain in turn.
    ///
    /// Each step handles its own failures; a step that panics is recorded
    /// and the remaining steps still run.
    pub async fn initialize(&self) -> InitReport {
        tracing::info!("Initializing session");
        let mut report = InitReport::default();

        report
            .steps
            .push(run_step(InitStep::Credentials, self.credentials.load()).await);
        report.steps.push(
            run_step(InitStep::DownloadPath, self.preferences.load_download_path()).await,
        );
        report.steps.push(
            run_step(
                InitStep::AppendArtistAlbum,
                self.preferences.load_append_artist_album(),
            )
            .await,
        );
        report
            .steps
            .push(run_step(InitStep::UpdateCheck, self.updates.check().map(|_| ())).await);

        tracing::info!(all_completed = report.all_completed(), "Session initialized");
        report
    }

    /// Attach the download monitor to the progress channel
    pub fn start_download_monitor(&self, receiver: ProgressReceiver) -> JoinHandle<()> {
        self.downloads.spawn(receiver)
    }
}

async fn run_step<F>(step: InitStep, fut: F) -> StepOutcome
where
    F: Future<Output = ()>,
{
    tracing::debug!(step = step.description(), "Running init step");
    let completed = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(()) => true,
        Err(_) => {
            tracing::error!(step = step.description(), "Init step panicked, continuing");
            false
        }
    };
    StepOutcome { step, completed }
}
