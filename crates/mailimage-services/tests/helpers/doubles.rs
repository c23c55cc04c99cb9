use async_trait::async_trait;
use mailimage_core::{AppError, Entry, EntryId, Sender};
use mailimage_db::{MemoryMetadataStore, MetadataStore};
use mailimage_processing::{ImageThumbnailer, ThumbnailRenderer};
use mailimage_services::Notifier;
use mailimage_storage::{MemoryStorage, Storage, StorageError, StorageResult};
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};

/// Renderer that counts how often it decodes
pub struct CountingRenderer {
    inner: ImageThumbnailer,
    calls: AtomicUsize,
}

impl CountingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: ImageThumbnailer::new(width, height),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ThumbnailRenderer for CountingRenderer {
    fn render(&self, source: &[u8]) -> Result<Vec<u8>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(source)
    }
}

/// Memory storage whose uploads fail for keys under a prefix
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_prefix: &'static str,
}

impl FailingStorage {
    pub fn new(inner: MemoryStorage, fail_prefix: &'static str) -> Self {
        Self { inner, fail_prefix }
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        if storage_key.starts_with(self.fail_prefix) {
            return Err(StorageError::UploadFailed(format!(
                "injected failure for {}",
                storage_key
            )));
        }
        self.inner
            .upload_with_key(storage_key, data, content_type)
            .await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }
}

/// Memory metadata store with injectable write failures
#[derive(Default)]
pub struct FailingMetadataStore {
    inner: MemoryMetadataStore,
    fail_entries: bool,
    fail_tokens: bool,
}

impl FailingMetadataStore {
    pub fn failing_entries() -> Self {
        Self {
            fail_entries: true,
            ..Self::default()
        }
    }

    pub fn failing_tokens() -> Self {
        Self {
            fail_tokens: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MetadataStore for FailingMetadataStore {
    async fn next_id(&self) -> Result<EntryId, AppError> {
        self.inner.next_id().await
    }

    async fn put_entry(&self, entry: &Entry) -> Result<(), AppError> {
        if self.fail_entries {
            return Err(AppError::Database("injected entry failure".to_string()));
        }
        self.inner.put_entry(entry).await
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, AppError> {
        self.inner.get_entry(id).await
    }

    async fn remove_entry(&self, id: EntryId) -> Result<(), AppError> {
        self.inner.remove_entry(id).await
    }

    async fn list_ids(&self) -> Result<Vec<EntryId>, AppError> {
        self.inner.list_ids().await
    }

    async fn set_token(&self, token: &str, id: EntryId, ttl: Duration) -> Result<(), AppError> {
        if self.fail_tokens {
            return Err(AppError::Database("injected token failure".to_string()));
        }
        self.inner.set_token(token, id, ttl).await
    }

    async fn resolve_token(&self, token: &str) -> Result<EntryId, AppError> {
        self.inner.resolve_token(token).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Success {
        to: Sender,
        subject: String,
        delete_link: String,
    },
    Errors {
        to: Sender,
        subject: String,
        messages: Vec<String>,
    },
}

/// Notifier that records every reply
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_success(
        &self,
        recipient: &Sender,
        subject: &str,
        delete_link: &str,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(Sent::Success {
            to: recipient.clone(),
            subject: subject.to_string(),
            delete_link: delete_link.to_string(),
        });
        Ok(())
    }

    async fn notify_errors(
        &self,
        recipient: &Sender,
        subject: &str,
        messages: &[String],
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(Sent::Errors {
            to: recipient.clone(),
            subject: subject.to_string(),
            messages: messages.to_vec(),
        });
        Ok(())
    }
}

/// Notifier whose every send fails
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_success(&self, _: &Sender, _: &str, _: &str) -> Result<(), AppError> {
        Err(AppError::Notification("relay unavailable".to_string()))
    }

    async fn notify_errors(&self, _: &Sender, _: &str, _: &[String]) -> Result<(), AppError> {
        Err(AppError::Notification("relay unavailable".to_string()))
    }
}

/// Reader that turns the directory at `path` into a plain file on its first read, after
/// the pipeline has created its backup folders
pub struct ReplaceDirWithFile<R> {
    pub inner: R,
    pub path: PathBuf,
}

impl<R: AsyncRead + Unpin> AsyncRead for ReplaceDirWithFile<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.path.is_dir() {
            std::fs::remove_dir(&self.path)?;
            std::fs::write(&self.path, b"")?;
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}
