//! Object retrieval.

use async_trait::async_trait;
use bytes::Bytes;
use snafu::prelude::*;
use tracing::debug;

use crate::config::SourceConfig;
use crate::emit;
use crate::error::{FetchError, ObjectFetchSnafu};
use crate::metrics::events::BytesRead;
use crate::storage::{StoragePool, StoragePoolRef};

/// Retrieves the content of an uploaded object.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError>;
}

/// Fetcher backed by [`StorageProvider`](crate::storage::StorageProvider)s,
/// one per bucket, resolved through the source URL template.
#[derive(Debug)]
pub struct StorageFetcher {
    config: SourceConfig,
    pool: StoragePoolRef,
}

impl StorageFetcher {
    pub fn new(config: SourceConfig) -> Self {
        Self::with_pool(config, StoragePoolRef::new(StoragePool::new()))
    }

    /// Share an existing pool, e.g. with the diagnostics writer.
    pub fn with_pool(config: SourceConfig, pool: StoragePoolRef) -> Self {
        Self { config, pool }
    }
}

#[async_trait]
impl ObjectFetcher for StorageFetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        let url = self.config.url_for_bucket(bucket);
        let context = ObjectFetchSnafu { bucket, key };

        let provider = self
            .pool
            .get_or_create(&url, &self.config.storage_options)
            .await
            .context(context)?;
        let bytes = provider.get(key).await.context(context)?;

        debug!(bucket, key, bytes = bytes.len(), "Fetched object");
        emit!(BytesRead {
            bytes: bytes.len() as u64
        });
        Ok(bytes)
    }
}
