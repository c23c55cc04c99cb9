use async_trait::async_trait;
use mailimage_core::{AppError, Entry, EntryId};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::store::MetadataStore;

#[derive(Default)]
struct Inner {
    last_id: EntryId,
    entries: HashMap<EntryId, Entry>,
    ids: HashSet<EntryId>,
    /// Token to entry and expiry instant. `None` never expires.
    tokens: HashMap<String, (EntryId, Option<Instant>)>,
    entry_tokens: HashMap<EntryId, String>,
}

/// In-process metadata store with the same semantics as the Redis backend.
///
/// Expiry is tracked explicitly, so resolving an expired token reports `TokenExpired`
/// instead of plain absence.
#[derive(Default)]
pub struct MemoryMetadataStore {
    inner: Mutex<Inner>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens currently held, expired ones included.
    pub async fn token_count(&self) -> usize {
        self.inner.lock().await.tokens.len()
    }
}

fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|at| now >= at)
}

impl Inner {
    fn prune_expired_tokens(&mut self, now: Instant) {
        let expired: Vec<(String, EntryId)> = self
            .tokens
            .iter()
            .filter(|(_, (_, expires_at))| is_expired(*expires_at, now))
            .map(|(token, (id, _))| (token.clone(), *id))
            .collect();

        for (token, id) in expired {
            self.tokens.remove(&token);
            if self.entry_tokens.get(&id) == Some(&token) {
                self.entry_tokens.remove(&id);
            }
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn next_id(&self) -> Result<EntryId, AppError> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        Ok(inner.last_id)
    }

    async fn put_entry(&self, entry: &Entry) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(entry.id, entry.clone());
        inner.ids.insert(entry.id);
        Ok(())
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        Ok(self.inner.lock().await.entries.get(&id).cloned())
    }

    async fn remove_entry(&self, id: EntryId) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.entries.remove(&id);
        inner.ids.remove(&id);
        if let Some(token) = inner.entry_tokens.remove(&id) {
            inner.tokens.remove(&token);
        }
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<EntryId>, AppError> {
        Ok(self.inner.lock().await.ids.iter().copied().collect())
    }

    async fn set_token(&self, token: &str, id: EntryId, ttl: Duration) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        inner.prune_expired_tokens(now);

        // A ttl past the end of the clock never expires
        let expires_at = now.checked_add(ttl);
        inner.tokens.insert(token.to_string(), (id, expires_at));
        inner.entry_tokens.insert(id, token.to_string());
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<EntryId, AppError> {
        let mut inner = self.inner.lock().await;
        let (id, expires_at) = inner
            .tokens
            .get(token)
            .copied()
            .ok_or_else(|| AppError::NotFound("Unknown delete token".to_string()))?;

        if is_expired(expires_at, Instant::now()) {
            inner.tokens.remove(token);
            if inner.entry_tokens.get(&id).map(String::as_str) == Some(token) {
                inner.entry_tokens.remove(&id);
            }
            return Err(AppError::TokenExpired("Delete token has expired".to_string()));
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: EntryId) -> Entry {
        Entry {
            id,
            from_name: "Alice".to_string(),
            from_address: "a@example.com".to_string(),
            subject: "Sunset".to_string(),
            text: String::new(),
            extension: "png".to_string(),
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = MemoryMetadataStore::new();
        let a = store.next_id().await.unwrap();
        let b = store.next_id().await.unwrap();
        assert_eq!(a, 1);
        assert!(b > a);
    }

    #[tokio::test]
    async fn remove_entry_drops_record_set_and_token() {
        let store = MemoryMetadataStore::new();
        store.put_entry(&entry(3)).await.unwrap();
        store
            .set_token("tok", 3, Duration::from_secs(60))
            .await
            .unwrap();

        store.remove_entry(3).await.unwrap();

        assert!(store.get_entry(3).await.unwrap().is_none());
        assert!(store.list_ids().await.unwrap().is_empty());
        assert!(matches!(
            store.resolve_token("tok").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let store = MemoryMetadataStore::new();
        store
            .set_token("tok", 1, Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(matches!(
            store.resolve_token("tok").await,
            Err(AppError::TokenExpired(_))
        ));
    }

    #[tokio::test]
    async fn huge_ttl_never_expires() {
        let store = MemoryMetadataStore::new();
        store
            .set_token("tok", 4, Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert_eq!(store.resolve_token("tok").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn set_token_prunes_expired_tokens() {
        let store = MemoryMetadataStore::new();
        store
            .set_token("old1", 1, Duration::from_millis(10))
            .await
            .unwrap();
        store
            .set_token("old2", 2, Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        store
            .set_token("fresh", 3, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.token_count().await, 1);
        assert!(matches!(
            store.resolve_token("old1").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(store.resolve_token("fresh").await.unwrap(), 3);
    }
}
