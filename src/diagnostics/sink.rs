//! Logging sinks for diagnostics.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::SecondsFormat;
use object_store::PutPayload;
use object_store::path::Path;
use snafu::prelude::*;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::DiagnosticsConfig;
use crate::dispatch::Ack;
use crate::error::{LogSerializeSnafu, LogSinkError, LogStorageSnafu, LogWriteSnafu};
use crate::storage::{StorageProvider, StorageProviderRef};

use super::entry::LogEntry;

/// Destination for diagnostics.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn publish(&self, entry: &LogEntry) -> Result<Ack, LogSinkError>;
}

/// Explicit outcome of storing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStoreResponse {
    pub status_code: u16,
    pub body: String,
}

/// Writes each entry as its own JSON object under the log location.
///
/// Objects are named `{type} - {timestamp} - {uuid}`.
#[derive(Debug, Clone)]
pub struct StorageLogSink {
    storage: StorageProviderRef,
}

impl StorageLogSink {
    pub fn new(storage: StorageProviderRef) -> Self {
        Self { storage }
    }

    pub async fn from_config(config: &DiagnosticsConfig) -> Result<Self, LogSinkError> {
        let storage =
            StorageProvider::for_writable_url(&config.log_path, config.storage_options.clone())
                .await
                .context(LogStorageSnafu)?;
        debug!(log_path = %config.log_path, "Diagnostics log sink ready");
        Ok(Self::new(Arc::new(storage)))
    }

    /// Object name for an entry.
    pub fn object_name(entry: &LogEntry) -> String {
        format!(
            "{} - {} - {}",
            entry.entry_type,
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            Uuid::new_v4()
        )
    }

    async fn write(&self, entry: &LogEntry) -> Result<String, LogSinkError> {
        let body = serde_json::to_vec(entry).context(LogSerializeSnafu)?;
        let name = Self::object_name(entry);
        self.storage
            .put_payload(&Path::from(name.as_str()), PutPayload::from(Bytes::from(body)))
            .await
            .context(LogWriteSnafu)?;
        Ok(name)
    }

    /// Store an entry, reporting the outcome as a response instead of an error.
    pub async fn store(&self, entry: &LogEntry) -> LogStoreResponse {
        match self.write(entry).await {
            Ok(name) => LogStoreResponse {
                status_code: 200,
                body: format!("Log stored as {name}"),
            },
            Err(e) => {
                error!(error = %e, "Failed to store log entry");
                LogStoreResponse {
                    status_code: 500,
                    body: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl LogSink for StorageLogSink {
    async fn publish(&self, entry: &LogEntry) -> Result<Ack, LogSinkError> {
        self.write(entry).await?;
        Ok(Ack::new(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{EntryType, LogPayload};
    use crate::metrics::events::FailureKind;
    use std::collections::HashMap;
    use tempfile::TempDir;

    async fn sink_in(temp_dir: &TempDir) -> StorageLogSink {
        StorageLogSink::from_config(&DiagnosticsConfig {
            log_path: temp_dir.path().join("logs").display().to_string(),
            storage_options: HashMap::new(),
            store_only_errors: false,
        })
        .await
        .unwrap()
    }

    fn stored_files(temp_dir: &TempDir) -> Vec<(String, serde_json::Value)> {
        std::fs::read_dir(temp_dir.path().join("logs"))
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                let name = entry.file_name().to_string_lossy().into_owned();
                let content = std::fs::read(entry.path()).unwrap();
                (name, serde_json::from_slice(&content).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_object_name_format() {
        let entry = LogEntry::new(EntryType::Success, "ok");
        let name = StorageLogSink::object_name(&entry);
        let parts: Vec<&str> = name.split(" - ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "success");
        assert!(parts[1].ends_with('Z'));
        assert!(Uuid::parse_str(parts[2]).is_ok());
    }

    #[tokio::test]
    async fn test_publish_writes_json_object() {
        let temp_dir = TempDir::new().unwrap();
        let sink = sink_in(&temp_dir).await;

        let entry = LogEntry::failure(FailureKind::EmptyObject, "Error fetching file e.csv")
            .with_payload(LogPayload::Raw(String::new()));
        let ack = sink.publish(&entry).await.unwrap();
        assert!(ack.is_success());

        let files = stored_files(&temp_dir);
        assert_eq!(files.len(), 1);
        let (name, body) = &files[0];
        assert!(name.starts_with("error - "));
        assert_eq!(body["message"], "Error fetching file e.csv");
        assert_eq!(body["kind"], "empty_object");
    }

    #[tokio::test]
    async fn test_store_reports_failure_as_500() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the log directory should be.
        let blocker = temp_dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"x").unwrap();
        let storage =
            StorageProvider::for_url_with_options(&blocker.display().to_string(), HashMap::new())
                .await
                .unwrap();
        let sink = StorageLogSink::new(Arc::new(storage));

        let response = sink.store(&LogEntry::info("hello")).await;
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Failed to write log entry"));
        assert!(sink.publish(&LogEntry::info("hello")).await.is_err());
    }

    #[tokio::test]
    async fn test_store_reports_status() {
        let temp_dir = TempDir::new().unwrap();
        let sink = sink_in(&temp_dir).await;

        let response = sink.store(&LogEntry::info("hello")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(stored_files(&temp_dir).len(), 1);
    }
}
