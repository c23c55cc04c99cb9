//! Raw backup lifecycle
//!
//! Every submission's original bytes are written to disk before anything else happens and
//! then filed into the folder naming its outcome. There is always exactly one copy: the
//! file is renamed between folders, never copied.

use crate::traits::{StorageError, StorageResult};
use mailimage_core::EntryId;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const READ_CHUNK_SIZE: usize = 8 * 1024;
const NAME_SUFFIX_LEN: usize = 6;

/// Lifecycle folder a raw backup is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupFolder {
    InProgress,
    Error,
    Invalid,
    Success,
}

impl BackupFolder {
    pub const ALL: [BackupFolder; 4] = [
        BackupFolder::InProgress,
        BackupFolder::Error,
        BackupFolder::Invalid,
        BackupFolder::Success,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            BackupFolder::InProgress => "in-progress",
            BackupFolder::Error => "error",
            BackupFolder::Invalid => "invalid",
            BackupFolder::Success => "success",
        }
    }
}

impl fmt::Display for BackupFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Handle on the single raw copy of one submission.
#[derive(Debug)]
pub struct RawBackup {
    root: PathBuf,
    name: String,
    folder: BackupFolder,
    file: Option<fs::File>,
}

fn in_progress_name() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NAME_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "{}-{}",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"),
        suffix
    )
}

/// Create the four lifecycle folders under `root`.
pub async fn create_folders(root: &Path) -> StorageResult<()> {
    for folder in BackupFolder::ALL {
        let dir = root.join(folder.dir_name());
        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create backup folder {}: {}",
                dir.display(),
                e
            ))
        })?;
    }
    Ok(())
}

impl RawBackup {
    /// Open a new, empty backup file under `in-progress`.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        create_folders(&root).await?;

        let name = in_progress_name();
        let path = root.join(BackupFolder::InProgress.dir_name()).join(&name);
        let file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create backup file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), "Raw backup opened");

        Ok(RawBackup {
            root,
            name,
            folder: BackupFolder::InProgress,
            file: Some(file),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder(&self) -> BackupFolder {
        self.folder
    }

    /// Current location of the backup file.
    pub fn path(&self) -> PathBuf {
        self.root.join(self.folder.dir_name()).join(&self.name)
    }

    /// Read `reader` to the end, writing every chunk to the backup file as it arrives, and
    /// return the full contents.
    ///
    /// Bytes read before a failure stay in the backup file.
    pub async fn tee<R>(&mut self, mut reader: R) -> StorageResult<Vec<u8>>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.path();
        let mut file = self.file.take().ok_or_else(|| {
            StorageError::BackendError(format!("Backup {} was already captured", path.display()))
        })?;

        let mut raw = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let n = reader.read(&mut chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read submission source: {}", e))
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&chunk[..n]).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write backup file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            raw.extend_from_slice(&chunk[..n]);
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync backup file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = raw.len(),
            "Raw submission captured"
        );

        Ok(raw)
    }

    /// Move the backup into `folder`, keeping its name.
    pub async fn move_to(&mut self, folder: BackupFolder) -> StorageResult<()> {
        let name = self.name.clone();
        self.rename(folder, name).await
    }

    /// File the backup under `success`, named by the entry identity.
    pub async fn commit(&mut self, id: EntryId) -> StorageResult<()> {
        self.rename(BackupFolder::Success, id.to_string()).await
    }

    async fn rename(&mut self, folder: BackupFolder, name: String) -> StorageResult<()> {
        if folder == self.folder && name == self.name {
            return Ok(());
        }

        // Close the handle before renaming
        self.file = None;

        let from = self.path();
        let to = self.root.join(folder.dir_name()).join(&name);
        fs::rename(&from, &to).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to move backup {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        tracing::info!(
            from = %from.display(),
            to = %to.display(),
            folder = %folder,
            "Raw backup moved"
        );

        self.folder = folder;
        self.name = name;
        Ok(())
    }
}

/// Remove the `success` backup of a deleted entry. An absent file is not an error.
pub async fn remove_success(root: &Path, id: EntryId) -> StorageResult<()> {
    let path = root
        .join(BackupFolder::Success.dir_name())
        .join(id.to_string());
    match fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Raw backup removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::DeleteFailed(format!(
            "Failed to delete backup {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn files_in(root: &Path, folder: BackupFolder) -> Vec<String> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(root.join(folder.dir_name())).await.unwrap();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names
    }

    #[tokio::test]
    async fn tee_writes_the_same_bytes_it_returns() {
        let dir = tempdir().unwrap();
        let mut backup = RawBackup::open(dir.path()).await.unwrap();
        let source = vec![b'x'; READ_CHUNK_SIZE * 2 + 17];

        let raw = backup.tee(&source[..]).await.unwrap();

        assert_eq!(raw, source);
        assert_eq!(fs::read(backup.path()).await.unwrap(), source);
        assert_eq!(backup.folder(), BackupFolder::InProgress);
    }

    #[tokio::test]
    async fn commit_renames_into_success_by_identity() {
        let dir = tempdir().unwrap();
        let mut backup = RawBackup::open(dir.path()).await.unwrap();
        backup.tee(&b"From: a@example.com\r\n\r\nhi"[..]).await.unwrap();

        backup.commit(12).await.unwrap();

        assert_eq!(files_in(dir.path(), BackupFolder::Success).await, vec!["12"]);
        assert!(files_in(dir.path(), BackupFolder::InProgress).await.is_empty());
    }

    #[tokio::test]
    async fn move_keeps_exactly_one_copy() {
        let dir = tempdir().unwrap();
        let mut backup = RawBackup::open(dir.path()).await.unwrap();
        backup.tee(&b"raw"[..]).await.unwrap();
        let name = backup.name().to_string();

        backup.move_to(BackupFolder::Invalid).await.unwrap();
        backup.move_to(BackupFolder::Error).await.unwrap();

        assert_eq!(files_in(dir.path(), BackupFolder::Error).await, vec![name]);
        assert!(files_in(dir.path(), BackupFolder::Invalid).await.is_empty());
        assert!(files_in(dir.path(), BackupFolder::InProgress).await.is_empty());
    }

    #[tokio::test]
    async fn tee_twice_fails() {
        let dir = tempdir().unwrap();
        let mut backup = RawBackup::open(dir.path()).await.unwrap();
        backup.tee(&b"raw"[..]).await.unwrap();
        assert!(backup.tee(&b"again"[..]).await.is_err());
    }

    #[tokio::test]
    async fn remove_success_ignores_missing_file() {
        let dir = tempdir().unwrap();
        create_folders(dir.path()).await.unwrap();
        assert!(remove_success(dir.path(), 99).await.is_ok());
    }
}
