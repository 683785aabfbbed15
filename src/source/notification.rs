//! S3 object-created notifications.

use serde::Deserialize;
use snafu::prelude::*;
use tracing::warn;

use crate::error::{NoRecordsSnafu, NotificationError, NotificationParseSnafu};

/// An S3 event notification as delivered to the trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    #[serde(rename = "Records")]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub s3: S3Entity,
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// URL-encoded object key.
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A decoded reference to one uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    pub size: Option<u64>,
}

impl Notification {
    /// Parse a notification body. A notification without records is an error.
    pub fn from_json(body: &str) -> Result<Self, NotificationError> {
        let notification: Notification =
            serde_json::from_str(body).context(NotificationParseSnafu)?;
        ensure!(!notification.records.is_empty(), NoRecordsSnafu);
        Ok(notification)
    }

    /// Objects referenced by this notification, keys decoded, in record order.
    pub fn objects(&self) -> Vec<ObjectRef> {
        self.records
            .iter()
            .map(|record| ObjectRef {
                bucket: record.s3.bucket.name.clone(),
                key: decode_key(&record.s3.object.key),
                size: record.s3.object.size,
            })
            .collect()
    }
}

/// Decode an S3 notification key: `+` is a space, then percent-decoding.
///
/// A key that does not percent-decode to UTF-8 is returned with only the
/// `+` substitution applied.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!(key = raw, error = %e, "Object key is not valid percent-encoding, using as is");
            spaced
        }
    }
}
