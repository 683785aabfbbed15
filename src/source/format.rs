//! File format detection from object keys.

use std::fmt;

use crate::error::{DecodeError, UnsupportedFormatSnafu};

/// Input encodings accepted for event files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    Jsonl,
}

impl FileFormat {
    /// Detect the format from the text after the key's last `.`.
    ///
    /// A key without a dot has no extension and is unsupported. Matching
    /// is case-sensitive, so `events.JSON` is unsupported.
    pub fn from_key(key: &str) -> Result<Self, DecodeError> {
        let Some((_, extension)) = key.rsplit_once('.') else {
            return UnsupportedFormatSnafu { key }.fail();
        };
        match extension {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "jsonl" => Ok(FileFormat::Jsonl),
            _ => UnsupportedFormatSnafu { key }.fail(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
