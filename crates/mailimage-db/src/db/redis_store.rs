use async_trait::async_trait;
use mailimage_core::{AppError, Entry, EntryId};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

use super::store::MetadataStore;

fn db_err(err: redis::RedisError) -> AppError {
    AppError::Database(err.to_string())
}

/// Key layout under a common prefix.
#[derive(Debug, Clone)]
pub struct RedisKeys {
    prefix: String,
}

impl RedisKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn last_id(&self) -> String {
        format!("{}:last_id", self.prefix)
    }

    pub fn entry(&self, id: EntryId) -> String {
        format!("{}:entry:{}", self.prefix, id)
    }

    pub fn entries(&self) -> String {
        format!("{}:entries", self.prefix)
    }

    pub fn delete_token(&self, token: &str) -> String {
        format!("{}:deletetoken:{}", self.prefix, token)
    }

    /// Reverse mapping from an entry to its live token
    pub fn entry_token(&self, id: EntryId) -> String {
        format!("{}:entrytoken:{}", self.prefix, id)
    }
}

/// Redis-backed metadata store
#[derive(Clone)]
pub struct RedisMetadataStore {
    conn: ConnectionManager,
    keys: RedisKeys,
}

impl RedisMetadataStore {
    /// Connect to Redis and verify the connection with a PING.
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url).map_err(db_err)?;
        let mut conn = ConnectionManager::new(client).await.map_err(db_err)?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(db_err)?;
        tracing::debug!(reply = %pong, "Redis connection verified");

        Ok(Self {
            conn,
            keys: RedisKeys::new(prefix),
        })
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    #[tracing::instrument(skip(self), fields(db.system = "redis", db.operation = "incr"))]
    async fn next_id(&self) -> Result<EntryId, AppError> {
        let mut conn = self.conn.clone();
        let id: i64 = conn.incr(self.keys.last_id(), 1).await.map_err(db_err)?;
        EntryId::try_from(id)
            .map_err(|_| AppError::Database(format!("identity counter returned {}", id)))
    }

    #[tracing::instrument(skip(self, entry), fields(db.system = "redis", db.operation = "hset", db.record_id = entry.id))]
    async fn put_entry(&self, entry: &Entry) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let fields = entry.to_fields();

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(self.keys.entry(entry.id), &fields[..])
            .ignore()
            .sadd(self.keys.entries(), entry.id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.system = "redis", db.operation = "hgetall", db.record_id = id))]
    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> =
            conn.hgetall(self.keys.entry(id)).await.map_err(db_err)?;
        Entry::from_fields(id, fields)
    }

    #[tracing::instrument(skip(self), fields(db.system = "redis", db.operation = "del", db.record_id = id))]
    async fn remove_entry(&self, id: EntryId) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let token: Option<String> = conn.get(self.keys.entry_token(id)).await.map_err(db_err)?;

        let mut keys = vec![self.keys.entry(id), self.keys.entry_token(id)];
        if let Some(token) = token {
            keys.push(self.keys.delete_token(&token));
        }

        let _: () = redis::pipe()
            .atomic()
            .srem(self.keys.entries(), id)
            .ignore()
            .del(keys)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.system = "redis", db.operation = "smembers"))]
    async fn list_ids(&self) -> Result<Vec<EntryId>, AppError> {
        let mut conn = self.conn.clone();
        let ids: Vec<EntryId> = conn.smembers(self.keys.entries()).await.map_err(db_err)?;
        Ok(ids)
    }

    #[tracing::instrument(skip(self, token), fields(db.system = "redis", db.operation = "psetex", db.record_id = id))]
    async fn set_token(&self, token: &str, id: EntryId, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let _: () = redis::pipe()
            .atomic()
            .pset_ex(self.keys.delete_token(token), id, millis)
            .ignore()
            .pset_ex(self.keys.entry_token(id), token, millis)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token), fields(db.system = "redis", db.operation = "get"))]
    async fn resolve_token(&self, token: &str) -> Result<EntryId, AppError> {
        let mut conn = self.conn.clone();
        let id: Option<EntryId> = conn
            .get(self.keys.delete_token(token))
            .await
            .map_err(db_err)?;

        // Redis drops expired keys, so expiry and absence look the same here
        id.ok_or_else(|| AppError::NotFound("Unknown or expired delete token".to_string()))
    }
}
