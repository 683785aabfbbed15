//! Provider caching for storage locations.
//!
//! Notifications for the same bucket arrive repeatedly, so providers are
//! built once per location and shared afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StorageError;

use super::{StorageProvider, StorageProviderRef};

/// Reference-counted handle to a [`StoragePool`].
pub type StoragePoolRef = Arc<StoragePool>;

/// Pool of storage providers keyed by their location URL.
#[derive(Default)]
pub struct StoragePool {
    providers: RwLock<HashMap<String, StorageProviderRef>>,
}

impl std::fmt::Debug for StoragePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoragePool").finish_non_exhaustive()
    }
}

fn provider_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl StoragePool {
    /// Create a new empty storage pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a storage provider for the given URL.
    pub async fn get_or_create(
        &self,
        url: &str,
        options: &HashMap<String, String>,
    ) -> Result<StorageProviderRef, StorageError> {
        let key = provider_key(url);

        {
            let providers = self.providers.read().await;
            if let Some(provider) = providers.get(&key) {
                return Ok(provider.clone());
            }
        }

        let mut providers = self.providers.write().await;
        // Another task may have won the race while we waited for the lock.
        if let Some(provider) = providers.get(&key) {
            return Ok(provider.clone());
        }

        let provider = Arc::new(StorageProvider::for_url_with_options(url, options.clone()).await?);
        providers.insert(key, provider.clone());
        Ok(provider)
    }

    /// Number of cached providers.
    pub async fn provider_count(&self) -> usize {
        self.providers.read().await.len()
    }

    /// Returns true if the pool is empty.
    pub async fn is_empty(&self) -> bool {
        self.providers.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pool_reuses_provider_for_same_location() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("bucket-a")).unwrap();
        let url = temp_dir.path().join("bucket-a").display().to_string();
        let pool = StoragePool::new();
        assert!(pool.is_empty().await);

        let first = pool.get_or_create(&url, &HashMap::new()).await.unwrap();
        let second = pool
            .get_or_create(&format!("{url}/"), &HashMap::new())
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.provider_count().await, 1);
    }

    #[tokio::test]
    async fn test_pool_separates_locations() {
        let temp_dir = TempDir::new().unwrap();
        let pool = StoragePool::new();

        for bucket in ["bucket-a", "bucket-b"] {
            std::fs::create_dir_all(temp_dir.path().join(bucket)).unwrap();
            let url = temp_dir.path().join(bucket).display().to_string();
            pool.get_or_create(&url, &HashMap::new()).await.unwrap();
        }

        assert_eq!(pool.provider_count().await, 2);
    }

    #[tokio::test]
    async fn test_pool_propagates_invalid_url() {
        let pool = StoragePool::new();
        let result = pool.get_or_create("ftp://nowhere", &HashMap::new()).await;
        assert!(result.is_err());
        assert!(pool.is_empty().await);
    }
}
