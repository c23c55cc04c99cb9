//! Lazy thumbnail cache
//!
//! Thumbnails are derived from the stored image on the first read and persisted under
//! `thumbnails/{id}.jpg`. A persisted thumbnail is never recomputed: committed images
//! are immutable, so nothing invalidates it. Concurrent first reads for the same id may
//! render twice and write the same bytes.

use mailimage_core::{AppError, EntryId};
use mailimage_db::EntryRepository;
use mailimage_processing::ThumbnailRenderer;
use mailimage_storage::keys::{
    content_type_for_extension, image_key, thumbnail_key, THUMBNAIL_EXTENSION,
};
use mailimage_storage::{Storage, StorageError};
use std::sync::Arc;

#[derive(Clone)]
pub struct ThumbnailCache {
    storage: Arc<dyn Storage>,
    entries: EntryRepository,
    renderer: Arc<dyn ThumbnailRenderer>,
}

impl ThumbnailCache {
    pub fn new(
        storage: Arc<dyn Storage>,
        entries: EntryRepository,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Self {
        Self {
            storage,
            entries,
            renderer,
        }
    }

    /// Thumbnail bytes of an entry. Unknown ids and missing images are `NotFound`.
    #[tracing::instrument(skip(self), fields(entry_id = id))]
    pub async fn get_thumbnail(&self, id: EntryId) -> Result<Vec<u8>, AppError> {
        let key = thumbnail_key(id);

        match self.storage.download(&key).await {
            Ok(bytes) => {
                tracing::debug!(key = %key, "Thumbnail cache hit");
                return Ok(bytes);
            }
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(key = %key, "Thumbnail cache miss");
            }
            Err(e) => return Err(e.into()),
        }

        let extension = self
            .entries
            .get_extension(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))?;

        let source = self
            .storage
            .download(&image_key(id, &extension))
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    AppError::NotFound(format!("Image of entry {} not found", id))
                }
                other => other.into(),
            })?;

        let start = std::time::Instant::now();
        let renderer = self.renderer.clone();
        let thumbnail = tokio::task::spawn_blocking(move || renderer.render(&source))
            .await
            .map_err(|e| AppError::Internal(format!("Thumbnail task failed: {}", e)))??;

        tracing::info!(
            entry_id = id,
            size_bytes = thumbnail.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail rendered"
        );

        if let Err(e) = self
            .storage
            .upload_with_key(
                &key,
                thumbnail.clone(),
                content_type_for_extension(THUMBNAIL_EXTENSION),
            )
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to persist thumbnail");
        }

        Ok(thumbnail)
    }
}
