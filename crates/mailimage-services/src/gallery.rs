//! Read and delete paths for published entries.

use mailimage_core::{AppError, EntryId, EntrySummary};
use mailimage_db::EntryRepository;
use mailimage_storage::backup;
use mailimage_storage::keys::{content_type_for_extension, image_key, thumbnail_key};
use mailimage_storage::{Storage, StorageError};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct Gallery {
    storage: Arc<dyn Storage>,
    entries: EntryRepository,
    backup_root: PathBuf,
}

impl Gallery {
    pub fn new(storage: Arc<dyn Storage>, entries: EntryRepository, backup_root: PathBuf) -> Self {
        Self {
            storage,
            entries,
            backup_root,
        }
    }

    /// Public summaries of all entries, newest first.
    pub async fn list_entries(&self) -> Result<Vec<EntrySummary>, AppError> {
        Ok(self
            .entries
            .list_entries()
            .await?
            .iter()
            .map(|entry| entry.summary())
            .collect())
    }

    /// Image bytes and content type. The requested extension must match the recorded one.
    #[tracing::instrument(skip(self), fields(entry_id = id))]
    pub async fn get_image(
        &self,
        id: EntryId,
        requested_extension: &str,
    ) -> Result<(Vec<u8>, &'static str), AppError> {
        let extension = self
            .entries
            .get_extension(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))?;

        if !extension.eq_ignore_ascii_case(requested_extension.trim_start_matches('.')) {
            return Err(AppError::NotFound(format!(
                "Entry {} has no .{} image",
                id, requested_extension
            )));
        }

        let data = self
            .storage
            .download(&image_key(id, &extension))
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => {
                    AppError::NotFound(format!("Image of entry {} not found", id))
                }
                other => other.into(),
            })?;

        Ok((data, content_type_for_extension(&extension)))
    }

    /// Delete the entry a delete token points to.
    pub async fn delete_by_token(&self, token: &str) -> Result<EntryId, AppError> {
        let id = self.entries.resolve_token(token).await?;
        self.delete_by_id(id).await?;
        Ok(id)
    }

    /// Revoke an entry, then remove its image, thumbnail and raw backup.
    ///
    /// File removals after the revoke are attempted in full; the first failure is returned.
    #[tracing::instrument(skip(self), fields(entry_id = id))]
    pub async fn delete_by_id(&self, id: EntryId) -> Result<(), AppError> {
        let entry = self
            .entries
            .get_entry(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))?;

        self.entries.revoke(id).await?;

        let mut first_error: Option<AppError> = None;

        for key in [image_key(id, &entry.extension), thumbnail_key(id)] {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::error!(key = %key, error = %e, "Failed to delete file of revoked entry");
                first_error.get_or_insert(e.into());
            }
        }

        if let Err(e) = backup::remove_success(&self.backup_root, id).await {
            tracing::error!(error = %e, "Failed to delete raw backup of revoked entry");
            first_error.get_or_insert(e.into());
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(entry_id = id, "Entry deleted");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailimage_core::Entry;
    use mailimage_db::MemoryMetadataStore;
    use mailimage_storage::{BackupFolder, MemoryStorage};
    use std::time::Duration;
    use tempfile::tempdir;

    struct Fixture {
        gallery: Gallery,
        storage: MemoryStorage,
        entries: EntryRepository,
        dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let storage = MemoryStorage::new();
        let entries = EntryRepository::new(
            Arc::new(MemoryMetadataStore::new()),
            8,
            Duration::from_secs(60),
        );
        let gallery = Gallery::new(
            Arc::new(storage.clone()),
            entries.clone(),
            dir.path().to_path_buf(),
        );
        Fixture {
            gallery,
            storage,
            entries,
            dir,
        }
    }

    async fn seed(f: &Fixture) -> (EntryId, String) {
        let id = f.entries.next_id().await.unwrap();
        f.entries
            .create_entry(&Entry {
                id,
                from_name: "Alice".to_string(),
                from_address: "a@example.com".to_string(),
                subject: "Sunset".to_string(),
                text: "Nice evening".to_string(),
                extension: "png".to_string(),
                created: Utc::now(),
            })
            .await
            .unwrap();
        f.storage
            .upload_with_key(&image_key(id, "png"), b"png-bytes".to_vec(), "image/png")
            .await
            .unwrap();
        f.storage
            .upload_with_key(&thumbnail_key(id), b"thumb".to_vec(), "image/jpeg")
            .await
            .unwrap();
        backup::create_folders(f.dir.path()).await.unwrap();
        tokio::fs::write(
            f.dir
                .path()
                .join(BackupFolder::Success.dir_name())
                .join(id.to_string()),
            b"raw",
        )
        .await
        .unwrap();
        let token = f.entries.issue_token(id).await.unwrap();
        (id, token)
    }

    #[tokio::test]
    async fn get_image_checks_extension() {
        let f = fixture().await;
        let (id, _) = seed(&f).await;

        let (data, content_type) = f.gallery.get_image(id, "png").await.unwrap();
        assert_eq!(data, b"png-bytes");
        assert_eq!(content_type, "image/png");

        assert!(f.gallery.get_image(id, "jpg").await.unwrap_err().is_not_found());
        assert!(f.gallery.get_image(id + 1, "png").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_by_token_removes_everything() {
        let f = fixture().await;
        let (id, token) = seed(&f).await;

        assert_eq!(f.gallery.delete_by_token(&token).await.unwrap(), id);

        assert!(f.entries.get_entry(id).await.unwrap().is_none());
        assert!(f.storage.is_empty());
        assert!(!f
            .dir
            .path()
            .join(BackupFolder::Success.dir_name())
            .join(id.to_string())
            .exists());
        assert!(f.gallery.list_entries().await.unwrap().is_empty());

        let again = f.gallery.delete_by_token(&token).await.unwrap_err();
        assert!(again.is_not_found());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let f = fixture().await;
        assert!(f.gallery.delete_by_id(404).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn listing_hides_sender_address() {
        let f = fixture().await;
        seed(&f).await;

        let summaries = f.gallery.list_entries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].from, "Alice");
        assert_eq!(summaries[0].title, "Sunset");
    }
}
