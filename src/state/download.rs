//! Download progress derived from the backend's free-text messages

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::backend::ProgressReceiver;

/// Exact message that ends a download session
pub const DONE_SENTINEL: &str = "Done";

/// Substring that marks a download as started
pub const DOWNLOADING_MARKER: &str = "Downloading";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Active,
}

/// Message scrollback plus the phase derived from it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadStatus {
    log: Vec<String>,
    phase: DownloadPhase,
}

impl DownloadStatus {
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn phase(&self) -> DownloadPhase {
        self.phase
    }

    pub fn is_downloading(&self) -> bool {
        self.phase == DownloadPhase::Active
    }

    /// Record one message and advance the phase.
    ///
    /// Returns true if the phase changed.
    pub fn apply(&mut self, message: String) -> bool {
        let next = if message == DONE_SENTINEL {
            DownloadPhase::Idle
        } else if self.phase == DownloadPhase::Idle && message.contains(DOWNLOADING_MARKER) {
            DownloadPhase::Active
        } else {
            self.phase
        };
        self.log.push(message);

        let changed = next != self.phase;
        self.phase = next;
        changed
    }

    pub fn clear(&mut self) {
        self.log.clear();
        self.phase = DownloadPhase::Idle;
    }
}

/// Consumes the progress channel for the lifetime of the session
pub struct DownloadProgressMonitor {
    status: watch::Sender<DownloadStatus>,
    /// Receivers of every phase change, in order
    transitions: Mutex<Vec<mpsc::UnboundedSender<DownloadPhase>>>,
}

impl DownloadProgressMonitor {
    pub fn new() -> Self {
        Self {
            status: watch::channel(DownloadStatus::default()).0,
            transitions: Mutex::new(Vec::new()),
        }
    }

    /// Every phase change from now on, without coalescing.
    ///
    /// The receiver ends when the progress stream being drained ends.
    pub fn transitions(&self) -> mpsc::UnboundedReceiver<DownloadPhase> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transition_senders().push(tx);
        rx
    }

    fn transition_senders(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<DownloadPhase>>> {
        self.transitions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadStatus> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> DownloadStatus {
        self.status.borrow().clone()
    }

    pub fn is_downloading(&self) -> bool {
        self.status.borrow().is_downloading()
    }

    /// Apply one message. Returns the new phase if it changed.
    pub fn handle_message(&self, message: String) -> Option<DownloadPhase> {
        tracing::debug!(message = %message.trim_end(), "Download update");
        let mut changed = None;
        self.status.send_modify(|status| {
            if status.apply(message) {
                changed = Some(status.phase());
            }
        });

        if let Some(phase) = changed {
            tracing::info!(?phase, "Download phase changed");
            self.transition_senders().retain(|tx| tx.send(phase).is_ok());
        }
        changed
    }

    /// Reset the scrollback between unrelated download sessions
    pub fn clear(&self) {
        self.status.send_modify(DownloadStatus::clear);
    }

    /// Drain `messages` in order until the stream ends
    pub async fn run<S>(&self, messages: S)
    where
        S: Stream<Item = String>,
    {
        futures::pin_mut!(messages);
        while let Some(message) = messages.next().await {
            self.handle_message(message);
        }
        self.transition_senders().clear();
        tracing::debug!("Download progress stream ended");
    }

    /// Run the monitor on its own task
    pub fn spawn(self: &Arc<Self>, receiver: ProgressReceiver) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run(receiver).await })
    }
}

impl Default for DownloadProgressMonitor {
    fn default() -> Self {
        Self::new()
    }
}
