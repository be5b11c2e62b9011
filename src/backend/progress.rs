//! Push channel for free-text download progress messages.

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Consumer side; a `Stream` of messages in emission order
pub type ProgressReceiver = UnboundedReceiverStream<String>;

/// Create the session-wide download progress channel
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, UnboundedReceiverStream::new(rx))
}

/// Producer side, held by whatever runs downloads
#[derive(Clone, Debug)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<String>,
}

impl ProgressSender {
    /// Emit one message. Returns false once the receiver is gone.
    pub fn emit(&self, message: impl Into<String>) -> bool {
        self.tx.send(message.into()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_messages_arrive_in_order_and_end_when_senders_drop() {
        let (tx, rx) = progress_channel();
        let tx2 = tx.clone();
        assert!(tx.emit("Downloading"));
        assert!(tx2.emit("track 1"));
        assert!(tx.emit("Done"));
        drop(tx);
        drop(tx2);

        let messages: Vec<String> = rx.collect().await;
        assert_eq!(messages, vec!["Downloading", "track 1", "Done"]);
    }

    #[tokio::test]
    async fn test_emit_after_receiver_dropped() {
        let (tx, rx) = progress_channel();
        drop(rx);
        assert!(!tx.emit("Downloading"));
    }
}
