//! Store wiring and command implementations behind the `mailimage` binary.
//!
//! Stores are opened once at start and the handles are passed to the pipeline, the
//! thumbnail cache and the gallery.

use anyhow::Context;
use mailimage_api::{setup_routes, start_server, AppState};
use mailimage_core::{Config, EntryId};
use mailimage_db::EntryRepository;
use mailimage_services::{
    create_metadata_store, create_notifier, create_storage, Gallery, MetadataStore, Storage,
    SubmissionPipeline, SubmitOutcome,
};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Opened store handles.
#[derive(Clone)]
pub struct Stores {
    pub metadata: Arc<dyn MetadataStore>,
    pub content: Arc<dyn Storage>,
}

impl Stores {
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let metadata = create_metadata_store(config)
            .await
            .context("Failed to open metadata store")?;
        let content = create_storage(config)
            .await
            .context("Failed to open content store")?;
        Ok(Self { metadata, content })
    }

    fn entries(&self, config: &Config) -> EntryRepository {
        EntryRepository::new(
            self.metadata.clone(),
            config.token_length,
            config.token_expiry,
        )
    }
}

pub async fn serve(config: Arc<Config>, stores: Stores, listen: &str) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_stores(
        config,
        stores.metadata,
        stores.content,
    ));
    start_server(listen, setup_routes(state)).await
}

/// Run one message through the submission pipeline.
///
/// A rejected submission is a normal outcome; only pipeline failures are errors.
pub async fn insert<R>(config: Arc<Config>, stores: Stores, source: R) -> anyhow::Result<SubmitOutcome>
where
    R: AsyncRead + Unpin + Send,
{
    let notifier = create_notifier(&config).context("Failed to set up reply mailer")?;
    let entries = stores.entries(&config);
    let pipeline = SubmissionPipeline::new(config, entries, stores.content, notifier);

    let outcome = pipeline
        .submit(source)
        .await
        .context("Submission failed")?;

    match &outcome {
        SubmitOutcome::Accepted { id, .. } => {
            tracing::info!(entry_id = id, "Submission published");
        }
        SubmitOutcome::Rejected { messages } => {
            tracing::info!(problems = messages.len(), "Submission rejected");
        }
    }
    Ok(outcome)
}

/// Remove an entry with all of its files.
pub async fn delete(config: Arc<Config>, stores: Stores, id: EntryId) -> anyhow::Result<()> {
    let gallery = Gallery::new(
        stores.content.clone(),
        stores.entries(&config),
        config.storage_path.clone(),
    );
    gallery
        .delete_by_id(id)
        .await
        .with_context(|| format!("Failed to delete entry {}", id))?;
    Ok(())
}
