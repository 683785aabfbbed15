//! Per-file intake pipeline.
//!
//! One uploaded object is handled end-to-end per call:
//!
//! 1. Gate on the key's extension (before any fetch)
//! 2. Fetch the object and reject empty content
//! 3. Decode, normalize and validate records
//! 4. Report invalid records, batch the valid ones and dispatch
//!
//! Failures never surface as errors. Each one becomes a diagnostic and the
//! returned [`FileReport`] records how far the file got.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::batch::{MAX_EVENTS_PER_INGEST_BATCH, partition};
use crate::config::Config;
use crate::diagnostics::{DiagnosticsEmitter, LogEntry, LogPayload, StorageLogSink};
use crate::dispatch::{DispatchCoordinator, DispatchReport, DispatchSink};
use crate::emit;
use crate::error::{DecodeError, EmptyObjectSnafu, NotificationError, PipelineError};
use crate::event::{normalize_all, partition_valid};
use crate::metrics::events::{
    FailureKind, FailureRecorded, FileProcessed, FileStatus, RecordsDecoded, RecordsRejected,
};
use crate::source::{FileFormat, Notification, ObjectFetcher, StorageFetcher, decode};

/// How far a file got through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Processing stopped after a file-level failure.
    Aborted(FailureKind),
    Processed {
        /// Records decoded from the file.
        records: usize,
        /// Records that failed validation.
        invalid: usize,
        /// Outcome of every dispatched batch.
        dispatch: DispatchReport,
    },
}

/// Result of processing one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub bucket: String,
    pub key: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn status(&self) -> FileStatus {
        match &self.outcome {
            FileOutcome::Aborted(_) => FileStatus::Failed,
            FileOutcome::Processed {
                invalid, dispatch, ..
            } if *invalid > 0 || dispatch.failed() > 0 => FileStatus::Partial,
            FileOutcome::Processed { .. } => FileStatus::Success,
        }
    }

    /// Number of batches handed to the dispatch sink.
    pub fn batches(&self) -> usize {
        match &self.outcome {
            FileOutcome::Aborted(_) => 0,
            FileOutcome::Processed { dispatch, .. } => dispatch.outcomes.len(),
        }
    }
}

/// The intake pipeline and its collaborators.
pub struct IngestPipeline {
    fetcher: Arc<dyn ObjectFetcher>,
    dispatcher: DispatchCoordinator,
    diagnostics: Arc<DiagnosticsEmitter>,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("dispatcher", &self.dispatcher)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl IngestPipeline {
    pub fn new(
        fetcher: Arc<dyn ObjectFetcher>,
        sink: Arc<dyn DispatchSink>,
        diagnostics: Arc<DiagnosticsEmitter>,
        target: impl Into<String>,
    ) -> Self {
        let dispatcher = DispatchCoordinator::new(sink, diagnostics.clone(), target);
        Self {
            fetcher,
            dispatcher,
            diagnostics,
        }
    }

    /// Build the storage-backed fetcher and log writer from configuration.
    pub async fn from_config(
        config: &Config,
        sink: Arc<dyn DispatchSink>,
    ) -> Result<Self, PipelineError> {
        let fetcher = StorageFetcher::new(config.source.clone());
        let log_sink = StorageLogSink::from_config(&config.diagnostics).await?;
        let diagnostics = Arc::new(DiagnosticsEmitter::new(
            Arc::new(log_sink),
            config.diagnostics.store_only_errors,
        ));

        info!(
            target = %config.dispatch.target,
            source = %config.source.url_template,
            log_path = %config.diagnostics.log_path,
            store_only_errors = config.diagnostics.store_only_errors,
            "Intake pipeline configured"
        );

        Ok(Self::new(
            Arc::new(fetcher),
            sink,
            diagnostics,
            config.dispatch.target.clone(),
        ))
    }

    /// Build from the `INGEST_*` and `STORE_ONLY_ERRORS` environment variables.
    pub async fn from_env(sink: Arc<dyn DispatchSink>) -> Result<Self, PipelineError> {
        let config = Config::from_env()?;
        Self::from_config(&config, sink).await
    }

    /// The emitter shared by every stage, e.g. for a forwarder.
    pub fn diagnostics(&self) -> Arc<DiagnosticsEmitter> {
        self.diagnostics.clone()
    }

    /// Parse a raw notification body and process every object in it.
    pub async fn handle_event(&self, body: &str) -> Result<Vec<FileReport>, NotificationError> {
        let notification = Notification::from_json(body)?;
        Ok(self.handle_notification(&notification).await)
    }

    /// Process every object in a notification, in record order.
    pub async fn handle_notification(&self, notification: &Notification) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(notification.records.len());
        for object in notification.objects() {
            reports.push(self.process_object(&object.bucket, &object.key).await);
        }
        reports
    }

    /// Process one uploaded object end-to-end.
    pub async fn process_object(&self, bucket: &str, key: &str) -> FileReport {
        let outcome = self.run_stages(bucket, key).await;
        let report = FileReport {
            bucket: bucket.to_string(),
            key: key.to_string(),
            outcome,
        };

        let status = report.status();
        emit!(FileProcessed { status });
        match &report.outcome {
            FileOutcome::Aborted(kind) => {
                info!(bucket, key, kind = %kind, "File aborted");
            }
            FileOutcome::Processed {
                records,
                invalid,
                dispatch,
            } => {
                info!(
                    bucket,
                    key,
                    records,
                    invalid,
                    batches = dispatch.outcomes.len(),
                    failed_batches = dispatch.failed(),
                    "File processed"
                );
            }
        }
        report
    }

    async fn run_stages(&self, bucket: &str, key: &str) -> FileOutcome {
        let format = match FileFormat::from_key(key) {
            Ok(format) => format,
            Err(e) => {
                return self
                    .abort(bucket, key, FailureKind::UnsupportedFormat, e.to_string(), None)
                    .await;
            }
        };

        let bytes = match self.fetcher.fetch(bucket, key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let kind = if e.is_empty_object() {
                    FailureKind::EmptyObject
                } else {
                    FailureKind::FetchError
                };
                return self.abort(bucket, key, kind, e.to_string(), None).await;
            }
        };
        if bytes.is_empty() {
            let message = EmptyObjectSnafu { key }.build().to_string();
            return self
                .abort(bucket, key, FailureKind::EmptyObject, message, None)
                .await;
        }

        let raw = match decode(format, key, &bytes) {
            Ok(raw) => raw,
            Err(e) => {
                let payload = match &e {
                    DecodeError::MalformedJson { .. } | DecodeError::InvalidUtf8 { .. } => {
                        Some(LogPayload::Raw(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    DecodeError::UnsupportedFormat { .. } => None,
                };
                return self
                    .abort(bucket, key, FailureKind::DecodeFailure, e.to_string(), payload)
                    .await;
            }
        };

        let records = raw.len();
        debug!(bucket, key, format = %format, records, "Decoded file");
        emit!(RecordsDecoded {
            count: records as u64
        });

        let partitioned = partition_valid(normalize_all(raw));
        let invalid = partitioned.invalid.len();
        if invalid > 0 {
            warn!(bucket, key, invalid, "File contains invalid records");
            emit!(RecordsRejected {
                count: invalid as u64
            });
            emit!(FailureRecorded {
                kind: FailureKind::InvalidRecord
            });
            let entry = LogEntry::failure(
                FailureKind::InvalidRecord,
                format!("Malformed events in file {key}."),
            )
            .with_object(bucket, key)
            .with_payload(LogPayload::Candidates(partitioned.invalid));
            self.diagnostics.emit(entry).await;
        }

        let batches = partition(partitioned.valid, MAX_EVENTS_PER_INGEST_BATCH);
        let dispatch = self.dispatcher.dispatch_all(batches).await;

        FileOutcome::Processed {
            records,
            invalid,
            dispatch,
        }
    }

    async fn abort(
        &self,
        bucket: &str,
        key: &str,
        kind: FailureKind,
        message: String,
        payload: Option<LogPayload>,
    ) -> FileOutcome {
        warn!(bucket, key, kind = %kind, message = %message, "Aborting file");
        emit!(FailureRecorded { kind });

        let mut entry = LogEntry::failure(kind, message).with_object(bucket, key);
        if let Some(payload) = payload {
            entry = entry.with_payload(payload);
        }
        self.diagnostics.emit(entry).await;

        FileOutcome::Aborted(kind)
    }
}
