use mailimage_core::{AppError, Entry, EntryId};
use std::sync::Arc;
use std::time::Duration;

use super::store::MetadataStore;
use super::token::generate_token;

/// Repository for entries, identities and delete tokens
#[derive(Clone)]
pub struct EntryRepository {
    store: Arc<dyn MetadataStore>,
    token_length: usize,
    token_expiry: Duration,
}

impl EntryRepository {
    pub fn new(store: Arc<dyn MetadataStore>, token_length: usize, token_expiry: Duration) -> Self {
        Self {
            store,
            token_length,
            token_expiry,
        }
    }

    /// Allocate a new identity. Identities are never reused; failed submissions leave gaps.
    #[tracing::instrument(skip(self), fields(db.operation = "next_id"))]
    pub async fn next_id(&self) -> Result<EntryId, AppError> {
        let id = self.store.next_id().await?;
        tracing::debug!(entry_id = id, "Allocated entry identity");
        Ok(id)
    }

    /// Create the entry record
    #[tracing::instrument(skip(self, entry), fields(db.operation = "insert", db.record_id = entry.id))]
    pub async fn create_entry(&self, entry: &Entry) -> Result<(), AppError> {
        self.store.put_entry(entry).await
    }

    #[tracing::instrument(skip(self), fields(db.operation = "select", db.record_id = id))]
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        self.store.get_entry(id).await
    }

    /// Recorded image extension of an entry, `None` for unknown ids.
    #[tracing::instrument(skip(self), fields(db.operation = "select", db.record_id = id))]
    pub async fn get_extension(&self, id: EntryId) -> Result<Option<String>, AppError> {
        Ok(self.store.get_entry(id).await?.map(|entry| entry.extension))
    }

    /// Issue a fresh delete token for an entry.
    #[tracing::instrument(skip(self), fields(db.operation = "insert", db.record_id = id))]
    pub async fn issue_token(&self, id: EntryId) -> Result<String, AppError> {
        let token = generate_token(self.token_length);
        self.store.set_token(&token, id, self.token_expiry).await?;
        tracing::debug!(entry_id = id, "Delete token issued");
        Ok(token)
    }

    /// Resolve a delete token to its entry. Fails with `NotFound` or `TokenExpired`.
    #[tracing::instrument(skip(self, token), fields(db.operation = "select"))]
    pub async fn resolve_token(&self, token: &str) -> Result<EntryId, AppError> {
        self.store.resolve_token(token).await
    }

    /// Remove the entry record and its token mapping. Files are the caller's concern.
    #[tracing::instrument(skip(self), fields(db.operation = "delete", db.record_id = id))]
    pub async fn revoke(&self, id: EntryId) -> Result<(), AppError> {
        self.store.remove_entry(id).await?;
        tracing::info!(entry_id = id, "Entry revoked");
        Ok(())
    }

    /// All entries, newest first.
    #[tracing::instrument(skip(self), fields(db.operation = "select"))]
    pub async fn list_entries(&self) -> Result<Vec<Entry>, AppError> {
        let ids = self.store.list_ids().await?;
        let mut entries = Vec::with_capacity(ids.len());

        for id in ids {
            match self.store.get_entry(id).await? {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!(entry_id = id, "Listed entry has no record, skipping");
                }
            }
        }

        entries.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}
