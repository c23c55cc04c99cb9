use crate::{LocalStorage, Storage, StorageResult};
use mailimage_core::Config;
use std::sync::Arc;

/// Create the content store rooted at the configured storage path
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.storage_path.clone()).await?;
    tracing::info!(
        path = %config.storage_path.display(),
        "Content store initialized"
    );
    Ok(Arc::new(storage))
}
