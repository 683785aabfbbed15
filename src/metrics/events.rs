//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the intake
//! pipeline. Events implement the `InternalEvent` trait which records the
//! corresponding metric.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Classification of everything that can go wrong while ingesting a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The object key has no supported extension.
    UnsupportedFormat,
    /// The object could not be retrieved.
    FetchError,
    /// The object exists but has no content.
    EmptyObject,
    /// The content could not be decoded.
    DecodeFailure,
    /// A record is missing a required field.
    InvalidRecord,
    /// The dispatch sink acknowledged with a failing status.
    DispatchFailure,
    /// The dispatch sink raised.
    DispatchException,
    /// A diagnostic could not be delivered to the logging sink.
    DiagnosticEmissionFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedFormat => "unsupported_format",
            FailureKind::FetchError => "fetch_error",
            FailureKind::EmptyObject => "empty_object",
            FailureKind::DecodeFailure => "decode_failure",
            FailureKind::InvalidRecord => "invalid_record",
            FailureKind::DispatchFailure => "dispatch_failure",
            FailureKind::DispatchException => "dispatch_exception",
            FailureKind::DiagnosticEmissionFailure => "diagnostic_emission_failure",
        }
    }

    /// Returns true if this failure stops processing of the whole file.
    pub fn aborts_file(&self) -> bool {
        matches!(
            self,
            FailureKind::UnsupportedFormat
                | FailureKind::FetchError
                | FailureKind::EmptyObject
                | FailureKind::DecodeFailure
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Success,
    Partial,
    Failed,
}

impl FileStatus {
    fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Success => "success",
            FileStatus::Partial => "partial",
            FileStatus::Failed => "failed",
        }
    }
}

/// Event emitted when an input file has been handled end-to-end.
pub struct FileProcessed {
    pub status: FileStatus,
}

impl InternalEvent for FileProcessed {
    fn emit(self) {
        trace!(status = self.status.as_str(), "File processed");
        counter!("flurry_files_processed_total", "status" => self.status.as_str()).increment(1);
    }
}

/// Event emitted for every classified failure.
pub struct FailureRecorded {
    pub kind: FailureKind,
}

impl InternalEvent for FailureRecorded {
    fn emit(self) {
        trace!(kind = self.kind.as_str(), "Failure recorded");
        counter!("flurry_failures_total", "kind" => self.kind.as_str()).increment(1);
    }
}

/// Event emitted when candidate records are decoded from a file.
pub struct RecordsDecoded {
    pub count: u64,
}

impl InternalEvent for RecordsDecoded {
    fn emit(self) {
        trace!(count = self.count, "Records decoded");
        counter!("flurry_records_decoded_total").increment(self.count);
    }
}

/// Event emitted when records fail validation.
pub struct RecordsRejected {
    pub count: u64,
}

impl InternalEvent for RecordsRejected {
    fn emit(self) {
        trace!(count = self.count, "Records rejected");
        counter!("flurry_records_rejected_total").increment(self.count);
    }
}

/// Event emitted when raw object bytes are read.
pub struct BytesRead {
    pub bytes: u64,
}

impl InternalEvent for BytesRead {
    fn emit(self) {
        trace!(bytes = self.bytes, "Bytes read");
        counter!("flurry_bytes_read_total").increment(self.bytes);
    }
}

/// Outcome of a single batch dispatch.
#[derive(Debug, Clone, Copy)]
pub enum DispatchStatus {
    Delivered,
    Rejected,
    Failed,
}

impl DispatchStatus {
    fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Delivered => "delivered",
            DispatchStatus::Rejected => "rejected",
            DispatchStatus::Failed => "failed",
        }
    }
}

/// Event emitted when a batch dispatch settles.
pub struct BatchDispatched {
    pub status: DispatchStatus,
    pub duration: Duration,
}

impl InternalEvent for BatchDispatched {
    fn emit(self) {
        trace!(
            status = self.status.as_str(),
            duration_ms = self.duration.as_millis(),
            "Batch dispatched"
        );
        counter!("flurry_batches_dispatched_total", "status" => self.status.as_str())
            .increment(1);
        histogram!("flurry_batch_dispatch_duration_seconds").record(self.duration.as_secs_f64());
    }
}

/// Outcome of a diagnostic emission.
#[derive(Debug, Clone, Copy)]
pub enum DiagnosticStatus {
    Published,
    Suppressed,
    Failed,
}

impl DiagnosticStatus {
    fn as_str(&self) -> &'static str {
        match self {
            DiagnosticStatus::Published => "published",
            DiagnosticStatus::Suppressed => "suppressed",
            DiagnosticStatus::Failed => "failed",
        }
    }
}

/// Event emitted for each diagnostic handed to the emitter.
pub struct DiagnosticEmitted {
    pub status: DiagnosticStatus,
}

impl InternalEvent for DiagnosticEmitted {
    fn emit(self) {
        trace!(status = self.status.as_str(), "Diagnostic emitted");
        counter!("flurry_diagnostics_total", "status" => self.status.as_str()).increment(1);
    }
}

/// Event emitted when a batch has been handed to the billing ingestion API.
pub struct BatchForwarded {
    pub success: bool,
    pub events: u64,
}

impl InternalEvent for BatchForwarded {
    fn emit(self) {
        let status = if self.success { "success" } else { "error" };
        trace!(status, events = self.events, "Batch forwarded");
        counter!("flurry_batches_forwarded_total", "status" => status).increment(1);
        if self.success {
            counter!("flurry_events_forwarded_total").increment(self.events);
        }
    }
}

// ============================================================================
// Storage operation events
// ============================================================================

/// Storage operation types.
#[derive(Debug, Clone, Copy)]
pub enum StorageOperation {
    Get,
    Put,
}

impl StorageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOperation::Get => "get",
            StorageOperation::Put => "put",
        }
    }
}

/// Status of a storage request.
#[derive(Debug, Clone, Copy)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Event emitted when a storage request completes.
pub struct StorageRequest {
    pub operation: StorageOperation,
    pub status: RequestStatus,
    pub duration: Duration,
}

impl InternalEvent for StorageRequest {
    fn emit(self) {
        trace!(
            operation = self.operation.as_str(),
            status = self.status.as_str(),
            duration_ms = self.duration.as_millis(),
            "Storage request"
        );
        counter!(
            "flurry_storage_requests_total",
            "operation" => self.operation.as_str(),
            "status" => self.status.as_str()
        )
        .increment(1);
        histogram!(
            "flurry_storage_request_duration_seconds",
            "operation" => self.operation.as_str()
        )
        .record(self.duration.as_secs_f64());
    }
}
