//! Error types for flurry using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase. Per-file processing failures are
//! not surfaced through these types to callers; they are classified into a
//! [`FailureKind`](crate::metrics::events::FailureKind) and reported as
//! diagnostics instead.

use snafu::prelude::*;

/// Boxed error returned by pluggable transport implementations.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed: {source}"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error: {source}"))]
    S3Config { source: object_store::Error },
}

impl StorageError {
    /// Check if this error represents a "not found" condition (404, NoSuchKey, etc.)
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::ObjectStore { source } => {
                matches!(source, object_store::Error::NotFound { .. })
            }
            _ => false,
        }
    }
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Dispatch target is empty.
    #[snafu(display("Dispatch target cannot be empty"))]
    EmptyDispatchTarget,

    /// Log path is empty.
    #[snafu(display("Diagnostics log path cannot be empty"))]
    EmptyLogPath,

    /// Source URL template does not reference the bucket.
    #[snafu(display("Source URL template must contain {{bucket}}: {template}"))]
    MissingBucketPlaceholder { template: String },

    /// Required environment variable is not set.
    #[snafu(display("Environment variable '{name}' is not set"))]
    MissingEnv { name: String },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file: {source}"))]
    ReadFile { source: std::io::Error },
}

// ============ Notification Errors ============

/// Errors that can occur while parsing an inbound object notification.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum NotificationError {
    /// The notification body is not a valid S3 event.
    #[snafu(display("Malformed object notification: {source}"))]
    NotificationParse { source: serde_json::Error },

    /// The notification carries no records.
    #[snafu(display("Object notification contains no records"))]
    NoRecords,
}

// ============ Fetch Errors ============

/// Errors that prevent retrieving an object's content.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// The object could not be read from storage.
    #[snafu(display("Error fetching object {key} from bucket {bucket}: {source}"))]
    ObjectFetch {
        bucket: String,
        key: String,
        source: StorageError,
    },

    /// The object exists but is zero bytes long.
    #[snafu(display("Error fetching file {key}: empty object"))]
    EmptyObject { key: String },
}

impl FetchError {
    /// Returns true when the object was read but had no content.
    pub fn is_empty_object(&self) -> bool {
        matches!(self, FetchError::EmptyObject { .. })
    }
}

// ============ Decode Errors ============

/// Errors that abort decoding of a single file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DecodeError {
    /// The object key has no supported extension.
    #[snafu(display(
        "Object created with unsupported format: {key}. Supported file extensions are csv, json and jsonl"
    ))]
    UnsupportedFormat { key: String },

    /// The file content is not valid UTF-8.
    #[snafu(display("File {key} is not valid UTF-8: {source}"))]
    InvalidUtf8 {
        key: String,
        source: std::str::Utf8Error,
    },

    /// The file content is not valid JSON.
    #[snafu(display("Malformed JSON in {key}: {source}"))]
    MalformedJson {
        key: String,
        source: serde_json::Error,
    },
}

// ============ Dispatch Errors ============

/// Errors raised by a dispatch sink while sending a batch.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DispatchError {
    /// The in-process consumer has gone away.
    #[snafu(display("Dispatch channel to {target} is closed"))]
    ChannelClosed { target: String },

    /// The underlying transport raised.
    #[snafu(display("Dispatch transport error: {source}"))]
    Transport { source: TransportError },

    /// The dispatch task panicked or was aborted.
    #[snafu(display("Dispatch task failed: {source}"))]
    DispatchJoin { source: tokio::task::JoinError },
}

// ============ Log Sink Errors ============

/// Errors raised by a logging sink while persisting a diagnostic.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LogSinkError {
    /// Failed to serialize the log entry.
    #[snafu(display("Failed to serialize log entry: {source}"))]
    LogSerialize { source: serde_json::Error },

    /// Failed to write the log entry.
    #[snafu(display("Failed to write log entry: {source}"))]
    LogWrite { source: StorageError },

    /// Failed to create log storage.
    #[snafu(display("Failed to create log storage: {source}"))]
    LogStorage { source: StorageError },
}

// ============ Forward Errors ============

/// Errors raised by the billing ingestion API.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ForwardError {
    /// The ingestion API rejected the batch.
    #[snafu(display("Ingestion API rejected batch with status {status}: {message}"))]
    Rejected { status: u16, message: String },
}

// ============ Pipeline Error (top-level) ============

/// Construction-time pipeline errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Log sink error.
    #[snafu(display("Log sink error: {source}"))]
    LogSink { source: LogSinkError },
}

impl From<ConfigError> for PipelineError {
    fn from(source: ConfigError) -> Self {
        PipelineError::Config { source }
    }
}

impl From<LogSinkError> for PipelineError {
    fn from(source: LogSinkError) -> Self {
        PipelineError::LogSink { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_conversions() {
        let err: PipelineError = ConfigError::EmptyLogPath.into();
        assert!(matches!(err, PipelineError::Config { .. }));
        assert!(err.to_string().contains("log path"));

        let storage = StorageError::InvalidUrl {
            url: "ftp://x".into(),
        };
        let err: PipelineError = LogSinkError::LogStorage { source: storage }.into();
        assert!(matches!(err, PipelineError::LogSink { .. }));
        assert!(err.to_string().contains("ftp://x"));
    }

    #[test]
    fn test_not_found_only_for_missing_objects() {
        let invalid = StorageError::InvalidUrl { url: "x".into() };
        assert!(!invalid.is_not_found());
    }
}
