//! Concurrent dispatch of batches to a downstream sink.
//!
//! Every batch is sent in its own task. The coordinator waits for all of
//! them, then reports each failure as a diagnostic. One batch failing never
//! affects its siblings.

mod sink;

pub use sink::{Ack, ChannelSink, DispatchSink};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{Id, JoinSet};
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::diagnostics::{DiagnosticsEmitter, LogEntry, LogPayload};
use crate::emit;
use crate::error::DispatchError;
use crate::metrics::events::{BatchDispatched, DispatchStatus, FailureKind, FailureRecorded};

/// Result of dispatching one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { status: u16 },
    /// The sink answered with a failing status.
    Rejected { status: u16 },
    /// The sink raised or the task panicked.
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Outcomes of a dispatch round, ordered by batch index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Fans batches out to a [`DispatchSink`] and reports failures.
pub struct DispatchCoordinator {
    sink: Arc<dyn DispatchSink>,
    diagnostics: Arc<DiagnosticsEmitter>,
    target: String,
}

impl std::fmt::Debug for DispatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCoordinator")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

type TaskResult = (usize, Result<Ack, DispatchError>, Duration);

impl DispatchCoordinator {
    pub fn new(
        sink: Arc<dyn DispatchSink>,
        diagnostics: Arc<DiagnosticsEmitter>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            diagnostics,
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Send every batch concurrently and wait for all of them to settle.
    pub async fn dispatch_all(&self, batches: Vec<Batch>) -> DispatchReport {
        let batches: Vec<Arc<Batch>> = batches.into_iter().map(Arc::new).collect();
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();
        let mut task_index: HashMap<Id, usize> = HashMap::with_capacity(batches.len());

        for (index, batch) in batches.iter().enumerate() {
            let sink = self.sink.clone();
            let batch = batch.clone();
            let handle = tasks.spawn(async move {
                let start = Instant::now();
                let result = sink.send(&batch).await;
                (index, result, start.elapsed())
            });
            task_index.insert(handle.id(), index);
        }

        debug!(target = %self.target, batches = batches.len(), "Dispatching batches");

        let mut outcomes: Vec<Option<DispatchOutcome>> = vec![None; batches.len()];
        while let Some(joined) = tasks.join_next_with_id().await {
            let (index, outcome) = match joined {
                Ok((_, (index, result, duration))) => {
                    let outcome = match result {
                        Ok(ack) if ack.is_success() => DispatchOutcome::Delivered {
                            status: ack.status_code,
                        },
                        Ok(ack) => DispatchOutcome::Rejected {
                            status: ack.status_code,
                        },
                        Err(e) => DispatchOutcome::Failed {
                            error: e.to_string(),
                        },
                    };
                    emit!(BatchDispatched {
                        status: dispatch_status(&outcome),
                        duration,
                    });
                    (index, outcome)
                }
                Err(join_error) => {
                    let Some(&index) = task_index.get(&join_error.id()) else {
                        warn!(error = %join_error, "Dispatch task without a batch index");
                        continue;
                    };
                    let error = DispatchError::DispatchJoin { source: join_error };
                    let outcome = DispatchOutcome::Failed {
                        error: error.to_string(),
                    };
                    emit!(BatchDispatched {
                        status: DispatchStatus::Failed,
                        duration: Duration::ZERO,
                    });
                    (index, outcome)
                }
            };
            outcomes[index] = Some(outcome);
        }

        let mut report = DispatchReport::default();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let outcome = outcome.unwrap_or_else(|| DispatchOutcome::Failed {
                error: "dispatch task did not complete".to_string(),
            });
            if let Some(entry) = self.failure_entry(index, &batches[index], &outcome) {
                self.diagnostics.emit(entry).await;
            }
            report.outcomes.push(outcome);
        }

        report
    }

    fn failure_entry(
        &self,
        index: usize,
        batch: &Batch,
        outcome: &DispatchOutcome,
    ) -> Option<LogEntry> {
        let (kind, message) = match outcome {
            DispatchOutcome::Delivered { .. } => return None,
            DispatchOutcome::Rejected { status } => {
                warn!(target = %self.target, batch = index, status, "Dispatch rejected");
                (
                    FailureKind::DispatchFailure,
                    format!("Invoking {} failed with status {}", self.target, status),
                )
            }
            DispatchOutcome::Failed { error } => {
                warn!(target = %self.target, batch = index, error = %error, "Dispatch raised");
                (
                    FailureKind::DispatchException,
                    format!("Exception invoking {}: {}", self.target, error),
                )
            }
        };

        emit!(FailureRecorded { kind });
        Some(LogEntry::failure(kind, message).with_payload(LogPayload::Batches(vec![batch.clone()])))
    }
}

fn dispatch_status(outcome: &DispatchOutcome) -> DispatchStatus {
    match outcome {
        DispatchOutcome::Delivered { .. } => DispatchStatus::Delivered,
        DispatchOutcome::Rejected { .. } => DispatchStatus::Rejected,
        DispatchOutcome::Failed { .. } => DispatchStatus::Failed,
    }
}
