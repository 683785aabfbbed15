//! Object storage abstraction.
//!
//! Wraps `object_store` behind a [`StorageProvider`] that knows how to build
//! a store from a URL (S3 or local filesystem), qualify keys with a
//! configured prefix, and record request metrics.

mod local;
mod pool;
mod s3;

pub use local::LocalConfig;
pub use pool::{StoragePool, StoragePoolRef};
pub use s3::S3Config;

use bytes::Bytes;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use regex::Regex;
use snafu::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use crate::emit;
use crate::error::{InvalidUrlSnafu, ObjectStoreSnafu, StorageError};
use crate::metrics::events::{RequestStatus, StorageOperation, StorageRequest};

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

/// Storage provider that abstracts over the supported backends.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

const S3_ENDPOINT_URL: &str = r"^[sS]3[aA]?::(?<protocol>https?)://(?P<endpoint>[^:/]+):(?<port>\d+)/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    S3,
    Local,
}

static MATCHERS: LazyLock<Vec<(Backend, Regex)>> = LazyLock::new(|| {
    [
        (Backend::S3, S3_ENDPOINT_URL),
        (Backend::S3, S3_URL),
        (Backend::Local, FILE_URI),
        (Backend::Local, FILE_PATH),
    ]
    .into_iter()
    .filter_map(|(backend, pattern)| Regex::new(pattern).ok().map(|r| (backend, r)))
    .collect()
});

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        for (backend, regex) in MATCHERS.iter() {
            if let Some(captures) = regex.captures(url) {
                let parsed = match backend {
                    Backend::S3 => Self::parse_s3(&captures),
                    Backend::Local => Self::parse_local(&captures),
                };
                if let Some(config) = parsed {
                    return Ok(config);
                }
            }
        }

        InvalidUrlSnafu {
            url: url.to_string(),
        }
        .fail()
    }

    fn parse_s3(captures: &regex::Captures) -> Option<Self> {
        let bucket = captures.name("bucket")?.as_str().to_string();

        let region = std::env::var("AWS_DEFAULT_REGION").ok();

        let endpoint = std::env::var("AWS_ENDPOINT").ok().or_else(|| {
            captures.name("endpoint").map(|endpoint| {
                let port = captures
                    .name("port")
                    .and_then(|p| p.as_str().parse::<u16>().ok())
                    .unwrap_or(443);
                let protocol = captures
                    .name("protocol")
                    .map(|p| p.as_str())
                    .unwrap_or("https");
                format!("{}://{}:{}", protocol, endpoint.as_str(), port)
            })
        });

        let key = captures.name("key").map(|m| Path::from(m.as_str()));

        Some(BackendConfig::S3(S3Config {
            endpoint,
            region,
            bucket,
            key,
        }))
    }

    fn parse_local(captures: &regex::Captures) -> Option<Self> {
        let path = captures.name("path")?.as_str();
        let path = format!("/{}", path.trim_start_matches('/'));
        Some(BackendConfig::Local(LocalConfig { path }))
    }

    pub(crate) fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::S3(s3) => s3.key.as_ref(),
            BackendConfig::Local(_) => None,
        }
    }
}

impl StorageProvider {
    /// Create a storage provider for the given URL with storage options.
    ///
    /// A local directory must already exist.
    pub async fn for_url_with_options(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        Self::construct(url, options, false).await
    }

    /// Like [`Self::for_url_with_options`], but creates a missing local
    /// directory. For locations that are written to.
    pub async fn for_writable_url(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        Self::construct(url, options, true).await
    }

    async fn construct(
        url: &str,
        options: HashMap<String, String>,
        create_local: bool,
    ) -> Result<Self, StorageError> {
        match BackendConfig::parse_url(url)? {
            BackendConfig::S3(config) => Self::construct_s3(config, options).await,
            BackendConfig::Local(config) => Self::construct_local(config, create_local).await,
        }
    }

    /// Canonical URL of the location this provider points at.
    pub fn url(&self) -> &str {
        &self.canonical_url
    }

    /// Get the contents of an object.
    pub async fn get(&self, path: impl Into<Path>) -> Result<Bytes, StorageError> {
        let path = path.into();
        let start = Instant::now();
        let result = match self.object_store.get(&self.qualify_path(&path)).await {
            Ok(response) => response.bytes().await,
            Err(e) => Err(e),
        };

        emit!(StorageRequest {
            operation: StorageOperation::Get,
            status: request_status(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)
    }

    /// Put a payload to a path.
    pub async fn put_payload(&self, path: &Path, payload: PutPayload) -> Result<(), StorageError> {
        let path = self.qualify_path(path);
        let start = Instant::now();
        let result = self.object_store.put(&path, payload).await;

        emit!(StorageRequest {
            operation: StorageOperation::Put,
            status: request_status(&result),
            duration: start.elapsed(),
        });

        result.context(ObjectStoreSnafu)?;
        Ok(())
    }

    /// Put raw bytes to a path.
    pub async fn put(&self, path: impl Into<Path>, bytes: impl Into<Bytes>) -> Result<(), StorageError> {
        let path = path.into();
        self.put_payload(&path, PutPayload::from(bytes.into())).await
    }

    /// Qualify a path with the configured key prefix.
    pub fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// Get the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

fn request_status<T, E>(result: &Result<T, E>) -> RequestStatus {
    if result.is_ok() {
        RequestStatus::Success
    } else {
        RequestStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_s3_url_parsing() {
        let config = BackendConfig::parse_url("s3://usage-drop/incoming").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "usage-drop");
                assert_eq!(s3.key, Some(Path::from("incoming")));
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_s3_bucket_only() {
        let config = BackendConfig::parse_url("s3://usage-drop").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "usage-drop");
                assert_eq!(s3.key, None);
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_s3_endpoint_url_parsing() {
        let config =
            BackendConfig::parse_url("s3::http://localhost:4566/usage-logs/ingest").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "usage-logs");
                assert_eq!(s3.key, Some(Path::from("ingest")));
                assert!(s3.endpoint.is_some());
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_local_url_parsing() {
        for url in ["/var/drop/bucket-a", "file:///var/drop/bucket-a"] {
            let config = BackendConfig::parse_url(url).unwrap();
            assert_eq!(
                config,
                BackendConfig::Local(LocalConfig {
                    path: "/var/drop/bucket-a".to_string()
                })
            );
        }
    }

    #[test]
    fn test_invalid_url() {
        assert!(BackendConfig::parse_url("ftp://somewhere/else").is_err());
        assert!(BackendConfig::parse_url("relative/path").is_err());
    }

    #[tokio::test]
    async fn test_local_put_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let url = temp_dir.path().join("bucket").display().to_string();
        let storage = StorageProvider::for_writable_url(&url, HashMap::new())
            .await
            .unwrap();

        storage
            .put("incoming/events.json", b"[]".to_vec())
            .await
            .unwrap();
        let content = storage.get("incoming/events.json").await.unwrap();
        assert_eq!(content.as_ref(), b"[]");
    }

    #[tokio::test]
    async fn test_readonly_provider_does_not_create_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("no-such-bucket");
        let url = missing.display().to_string();

        let result = StorageProvider::for_url_with_options(&url, HashMap::new()).await;
        assert!(result.is_err());
        assert!(!missing.exists());

        StorageProvider::for_writable_url(&url, HashMap::new())
            .await
            .unwrap();
        assert!(missing.is_dir());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let url = temp_dir.path().display().to_string();
        let storage = StorageProvider::for_url_with_options(&url, HashMap::new())
            .await
            .unwrap();

        let err = storage.get("nope.csv").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
