#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

use mailimage_core::Config;
use mailimage_db::{EntryRepository, MemoryMetadataStore, MetadataStore};
use mailimage_services::{Notifier, Storage, SubmissionPipeline};
use mailimage_storage::{BackupFolder, MemoryStorage};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use doubles::RecordingNotifier;

/// Pipeline wired to in-memory stores and a recording notifier
pub struct TestPipeline {
    pub pipeline: SubmissionPipeline,
    pub entries: EntryRepository,
    pub storage: MemoryStorage,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Arc<Config>,
    pub dir: TempDir,
}

impl TestPipeline {
    pub fn files_in(&self, folder: BackupFolder) -> Vec<String> {
        files_in(self.dir.path(), folder)
    }
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        storage_path: dir.path().to_path_buf(),
        ..Config::default()
    }
}

pub fn repository(store: Arc<dyn MetadataStore>) -> EntryRepository {
    EntryRepository::new(store, 8, Duration::from_secs(24 * 60 * 60))
}

pub async fn setup_pipeline() -> TestPipeline {
    let storage = MemoryStorage::new();
    setup_pipeline_with(
        Arc::new(MemoryMetadataStore::new()),
        Arc::new(storage.clone()),
        storage,
        None,
    )
    .await
}

/// Build a pipeline over the given store handles. `storage` is the handle the pipeline
/// writes through; `inspect` is the memory backend behind it, used for assertions.
pub async fn setup_pipeline_with(
    store: Arc<dyn MetadataStore>,
    storage: Arc<dyn Storage>,
    inspect: MemoryStorage,
    notifier: Option<Arc<dyn Notifier>>,
) -> TestPipeline {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(&dir));
    let entries = repository(store);
    let recorder = Arc::new(RecordingNotifier::default());
    let notifier = notifier.unwrap_or_else(|| recorder.clone() as Arc<dyn Notifier>);

    let pipeline = SubmissionPipeline::new(config.clone(), entries.clone(), storage, notifier);

    TestPipeline {
        pipeline,
        entries,
        storage: inspect,
        notifier: recorder,
        config,
        dir,
    }
}

pub fn files_in(root: &Path, folder: BackupFolder) -> Vec<String> {
    let dir = root.join(folder.dir_name());
    match std::fs::read_dir(dir) {
        Ok(read) => read
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
