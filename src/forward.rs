//! The consumer side of dispatch: hands batches to the billing ingestion
//! API and records the outcome of each call as a diagnostic.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::batch::Batch;
use crate::diagnostics::{DiagnosticsEmitter, EntryType, LogEntry, LogPayload};
use crate::emit;
use crate::error::ForwardError;
use crate::event::Event;
use crate::metrics::events::BatchForwarded;

/// The billing system's usage ingestion endpoint.
#[async_trait]
pub trait UsageIngestApi: Send + Sync {
    async fn ingest(&self, events: &[Event]) -> Result<(), ForwardError>;
}

/// Totals for a forwarder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub batches_ok: usize,
    pub batches_failed: usize,
    pub events_ok: usize,
}

/// Drains dispatched batches into a [`UsageIngestApi`].
pub struct BatchForwarder {
    api: Arc<dyn UsageIngestApi>,
    diagnostics: Arc<DiagnosticsEmitter>,
}

impl BatchForwarder {
    pub fn new(api: Arc<dyn UsageIngestApi>, diagnostics: Arc<DiagnosticsEmitter>) -> Self {
        Self { api, diagnostics }
    }

    /// Ingest one batch. Returns true on success.
    pub async fn forward(&self, batch: Batch) -> bool {
        let count = batch.len();
        let result = self.api.ingest(batch.events()).await;
        let success = result.is_ok();

        let entry = match result {
            Ok(()) => {
                debug!(events = count, "Batch ingested");
                LogEntry::success(format!("Ingested {count} events"))
            }
            Err(e) => {
                warn!(events = count, error = %e, "Batch ingestion failed");
                LogEntry::new(
                    EntryType::Error,
                    format!("Exception ingesting {count} events: {e}"),
                )
            }
        };
        self.diagnostics
            .emit(entry.with_payload(LogPayload::Events(batch.into_events())))
            .await;

        emit!(BatchForwarded {
            success,
            events: count as u64
        });
        success
    }

    /// Forward batches until every sender has been dropped.
    pub async fn run(self, mut receiver: mpsc::Receiver<Batch>) -> ForwardStats {
        let mut stats = ForwardStats::default();
        while let Some(batch) = receiver.recv().await {
            let count = batch.len();
            if self.forward(batch).await {
                stats.batches_ok += 1;
                stats.events_ok += count;
            } else {
                stats.batches_failed += 1;
            }
        }
        info!(
            batches_ok = stats.batches_ok,
            batches_failed = stats.batches_failed,
            events = stats.events_ok,
            "Forwarder finished"
        );
        stats
    }
}
