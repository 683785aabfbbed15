//! Diagnostics: structured log entries describing what went wrong (or
//! right) with an upload, and the emitter that routes them to a sink.
//!
//! Emission never fails the caller. A sink failure is logged, counted and
//! reported back as an [`EmitOutcome`].

mod entry;
mod sink;

pub use entry::{EntryType, LogEntry, LogPayload};
pub use sink::{LogSink, LogStoreResponse, StorageLogSink};

use std::sync::Arc;
use tracing::{debug, error};

use crate::emit;
use crate::metrics::events::{
    DiagnosticEmitted, DiagnosticStatus, FailureKind, FailureRecorded,
};

/// What happened to an emitted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Published,
    /// Dropped by the errors-only filter.
    Suppressed,
    /// The sink failed or answered with a failing status.
    Failed(String),
}

/// Routes diagnostics to a [`LogSink`], applying the errors-only filter.
pub struct DiagnosticsEmitter {
    sink: Arc<dyn LogSink>,
    store_only_errors: bool,
}

impl std::fmt::Debug for DiagnosticsEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticsEmitter")
            .field("store_only_errors", &self.store_only_errors)
            .finish_non_exhaustive()
    }
}

impl DiagnosticsEmitter {
    pub fn new(sink: Arc<dyn LogSink>, store_only_errors: bool) -> Self {
        Self {
            sink,
            store_only_errors,
        }
    }

    pub fn store_only_errors(&self) -> bool {
        self.store_only_errors
    }

    /// Publish an entry unless the filter drops it.
    pub async fn emit(&self, entry: LogEntry) -> EmitOutcome {
        if self.store_only_errors && !entry.is_error() {
            debug!(entry_type = %entry.entry_type, "Diagnostic suppressed");
            emit!(DiagnosticEmitted {
                status: DiagnosticStatus::Suppressed
            });
            return EmitOutcome::Suppressed;
        }

        let outcome = match self.sink.publish(&entry).await {
            Ok(ack) if ack.is_success() => EmitOutcome::Published,
            Ok(ack) => EmitOutcome::Failed(format!(
                "log sink answered with status {}",
                ack.status_code
            )),
            Err(e) => EmitOutcome::Failed(e.to_string()),
        };

        match &outcome {
            EmitOutcome::Failed(reason) => {
                error!(
                    entry_type = %entry.entry_type,
                    message = %entry.message,
                    reason = %reason,
                    "Failed to publish diagnostic"
                );
                emit!(FailureRecorded {
                    kind: FailureKind::DiagnosticEmissionFailure
                });
                emit!(DiagnosticEmitted {
                    status: DiagnosticStatus::Failed
                });
            }
            _ => {
                debug!(entry_type = %entry.entry_type, "Diagnostic published");
                emit!(DiagnosticEmitted {
                    status: DiagnosticStatus::Published
                });
            }
        }

        outcome
    }
}
