use async_trait::async_trait;
use mailimage_core::{AppError, Config, Entry, EntryId, MetadataBackend};
use std::sync::Arc;
use std::time::Duration;

use super::memory::MemoryMetadataStore;
use super::redis_store::RedisMetadataStore;

/// Key-value metadata backend.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Atomically increment the identity counter and return the new value.
    async fn next_id(&self) -> Result<EntryId, AppError>;

    /// Write the entry record and add it to the set of entries, atomically.
    async fn put_entry(&self, entry: &Entry) -> Result<(), AppError>;

    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError>;

    /// Remove the record, its set membership and its token mapping. Removing an unknown
    /// id succeeds.
    async fn remove_entry(&self, id: EntryId) -> Result<(), AppError>;

    async fn list_ids(&self) -> Result<Vec<EntryId>, AppError>;

    /// Associate `token` with `id` for `ttl`.
    async fn set_token(&self, token: &str, id: EntryId, ttl: Duration) -> Result<(), AppError>;

    /// Look up the id a token points to. Fails with `NotFound` or `TokenExpired`.
    async fn resolve_token(&self, token: &str) -> Result<EntryId, AppError>;
}

/// Factory function to create the metadata store selected by configuration
pub async fn create_metadata_store(config: &Config) -> Result<Arc<dyn MetadataStore>, AppError> {
    match config.metadata_backend {
        MetadataBackend::Redis => {
            tracing::info!(prefix = %config.key_prefix, "Initializing Redis metadata store");
            let store = RedisMetadataStore::connect(&config.redis_url, &config.key_prefix).await?;
            Ok(Arc::new(store))
        }
        MetadataBackend::Memory => {
            tracing::warn!("Initializing in-memory metadata store; entries are lost on exit");
            Ok(Arc::new(MemoryMetadataStore::new()))
        }
    }
}
