//! Downstream sinks batches are dispatched to.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;

use crate::batch::Batch;
use crate::error::DispatchError;

/// Acknowledgement from a sink. Statuses of 400 and above are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub status_code: u16,
}

impl Ack {
    pub fn new(status_code: u16) -> Self {
        Self { status_code }
    }

    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// A downstream consumer of batches.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn send(&self, batch: &Batch) -> Result<Ack, DispatchError>;
}

/// Fire-and-forget sink over a bounded in-process channel.
///
/// The batch is accepted (`202`) once it is queued; delivery happens when
/// the receiving side drains the channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    target: String,
    sender: mpsc::Sender<Batch>,
}

impl ChannelSink {
    /// Create a sink and the receiver a consumer drains.
    pub fn new(target: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<Batch>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                target: target.into(),
                sender,
            },
            receiver,
        )
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl DispatchSink for ChannelSink {
    async fn send(&self, batch: &Batch) -> Result<Ack, DispatchError> {
        self.sender
            .send(batch.clone())
            .await
            .map_err(|_| DispatchError::ChannelClosed {
                target: self.target.clone(),
            })?;
        trace!(target = %self.target, events = batch.len(), "Batch queued");
        Ok(Ack::new(202))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn batch() -> Batch {
        Batch::new(vec![Event {
            timestamp: "2024-01-01T00:00:00Z".into(),
            transaction_id: "t1".into(),
            customer_id: "c1".into(),
            event_type: "api_call".into(),
            properties: None,
        }])
        .unwrap()
    }

    #[test]
    fn test_ack_threshold() {
        assert!(Ack::new(200).is_success());
        assert!(Ack::new(399).is_success());
        assert!(!Ack::new(400).is_success());
        assert!(!Ack::new(500).is_success());
    }

    #[tokio::test]
    async fn test_channel_sink_queues_batch() {
        let (sink, mut rx) = ChannelSink::new("post-events", 4);
        let ack = sink.send(&batch()).await.unwrap();
        assert_eq!(ack.status_code, 202);
        assert_eq!(rx.recv().await.unwrap(), batch());
    }

    #[tokio::test]
    async fn test_closed_channel_is_error() {
        let (sink, rx) = ChannelSink::new("post-events", 4);
        drop(rx);
        let err = sink.send(&batch()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ChannelClosed { .. }));
    }
}
