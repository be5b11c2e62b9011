//! Download progress monitor fed from stdin

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::backend::progress_channel;
use crate::cli::output::{OutputFormat, print_formatted};
use crate::session::Session;
use crate::state::DownloadPhase;

#[derive(Serialize)]
struct MonitorSummary {
    messages: usize,
    transitions: usize,
    downloading: bool,
}

/// Forward each stdin line as a progress message until EOF
pub async fn run(session: &Session, format: OutputFormat, quiet: bool) -> Result<()> {
    let echo = !quiet && format == OutputFormat::Text;
    let transitions = follow(session, BufReader::new(tokio::io::stdin()), echo).await?;

    let status = session.downloads.snapshot();
    let summary = MonitorSummary {
        messages: status.log().len(),
        transitions: transitions.len(),
        downloading: status.is_downloading(),
    };
    print_formatted(&summary, format, |s| {
        format!(
            "{} messages, {} transitions, {}",
            s.messages,
            s.transitions,
            if s.downloading { "still downloading" } else { "idle" }
        )
    });

    Ok(())
}

/// Feed `input` line by line through the progress channel.
///
/// Returns every phase change in order, printing each one when `echo` is set.
async fn follow<R>(session: &Session, input: R, echo: bool) -> Result<Vec<DownloadPhase>>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, rx) = progress_channel();
    let mut changes = session.downloads.transitions();
    let task = session.start_download_monitor(rx);

    let printer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(phase) = changes.recv().await {
            if echo {
                match phase {
                    DownloadPhase::Active => println!("[downloading]"),
                    DownloadPhase::Idle => println!("[idle]"),
                }
            }
            seen.push(phase);
        }
        seen
    });

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if !tx.emit(line) {
            break;
        }
    }
    drop(tx);
    task.await?;

    // The transition feed closes once the monitor has drained the channel.
    Ok(printer.await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendHandle;
    use crate::backend::memory::InMemoryBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> Session {
        let backend = Arc::new(InMemoryBackend::new());
        Session::new(BackendHandle::new(backend, Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_every_cycle_in_a_burst_is_reported() {
        let session = session();
        let input: String = (0..200)
            .map(|n| format!("Downloading t{}\nDone\n", n))
            .collect();

        let transitions = follow(&session, input.as_bytes(), false).await.unwrap();

        assert_eq!(transitions.len(), 400);
        assert_eq!(
            transitions.iter().filter(|p| **p == DownloadPhase::Active).count(),
            200
        );
        assert_eq!(transitions.last(), Some(&DownloadPhase::Idle));
        assert_eq!(session.downloads.snapshot().log().len(), 400);
    }

    #[tokio::test]
    async fn test_unfinished_download_ends_active() {
        let session = session();
        let input = "noise\nDownloading \"Song\"\n42%\n";

        let transitions = follow(&session, input.as_bytes(), false).await.unwrap();

        assert_eq!(transitions, vec![DownloadPhase::Active]);
        assert!(session.downloads.is_downloading());
    }
}
