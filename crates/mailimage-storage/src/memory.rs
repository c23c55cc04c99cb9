//! In-process storage backend for tests. The binaries always store content on disk.

use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Storage implementation that keeps files in memory
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.files
            .lock()
            .map_err(|_| StorageError::BackendError("memory storage lock poisoned".to_string()))
    }

    /// Check if a file exists (for test assertions)
    pub fn has_file(&self, key: &str) -> bool {
        self.lock().map(|f| f.contains_key(key)).unwrap_or(false)
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().ok().and_then(|f| f.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        self.lock()?.insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.lock()?
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.lock()?.remove(storage_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes_files() {
        let storage = MemoryStorage::new();
        storage
            .upload_with_key("images/1.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(storage.download("images/1.png").await.unwrap(), vec![1, 2, 3]);

        storage.delete("images/1.png").await.unwrap();
        assert!(storage.is_empty());
        assert!(matches!(
            storage.download("images/1.png").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
