//! Diagnostic log entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::batch::Batch;
use crate::event::{Candidate, Event};
use crate::metrics::events::FailureKind;

/// Severity of a diagnostic. Only `Error` survives the errors-only filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Error,
    Success,
    Info,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Error => "error",
            EntryType::Success => "success",
            EntryType::Info => "info",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogPayload {
    /// Records that failed validation, as normalized.
    Candidates(Vec<Candidate>),
    Events(Vec<Event>),
    Batches(Vec<Batch>),
    /// Content that could not be decoded, verbatim.
    Raw(String),
}

/// A single diagnostic handed to the logging sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<LogPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(entry_type: EntryType, message: impl Into<String>) -> Self {
        Self {
            entry_type,
            message: message.into(),
            events: None,
            kind: None,
            bucket: None,
            key: None,
            timestamp: Utc::now(),
        }
    }

    /// An error entry classified under `kind`.
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(EntryType::Error, message).with_kind(kind)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EntryType::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EntryType::Info, message)
    }

    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_payload(mut self, payload: LogPayload) -> Self {
        self.events = Some(payload);
        self
    }

    pub fn with_object(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self.key = Some(key.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.entry_type == EntryType::Error
    }
}
