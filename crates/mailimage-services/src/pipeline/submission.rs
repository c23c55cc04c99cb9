use chrono::Utc;
use mailimage_core::{AppError, Config, Entry, EntryId, Sender};
use mailimage_db::EntryRepository;
use mailimage_processing::{parse_message, SubmissionValidator, ValidatedSubmission};
use mailimage_storage::keys::{content_type_for_extension, image_key};
use mailimage_storage::{BackupFolder, RawBackup, Storage};
use std::sync::Arc;
use tokio::io::AsyncRead;

use super::compensation::{Compensation, CompensationStack};
use crate::notify::{Notifier, INTERNAL_ERROR_MESSAGE, INTERNAL_ERROR_SUBJECT};

/// Terminal outcome of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Committed; the submitter was sent the delete link.
    Accepted { id: EntryId, token: String },
    /// Failed validation; the submitter was sent these messages.
    Rejected { messages: Vec<String> },
}

/// Commits submissions across the metadata store, the content store and the raw backup
/// folders, and replies to the submitter.
///
/// One invocation is strictly sequential. Concurrent invocations only share the atomic
/// identity counter; every path written after allocation is derived from the identity.
#[derive(Clone)]
pub struct SubmissionPipeline {
    config: Arc<Config>,
    entries: EntryRepository,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    validator: SubmissionValidator,
}

impl SubmissionPipeline {
    pub fn new(
        config: Arc<Config>,
        entries: EntryRepository,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let validator = SubmissionValidator::from_config(&config);
        Self {
            config,
            entries,
            storage,
            notifier,
            validator,
        }
    }

    /// Process one submission read from `source`.
    ///
    /// Validation problems are a normal outcome (`Rejected`). An `Err` means the
    /// submission could not be committed; its raw backup was moved to `error`.
    #[tracing::instrument(skip(self, source), fields(backup = tracing::field::Empty))]
    pub async fn submit<R>(&self, source: R) -> Result<SubmitOutcome, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut backup = RawBackup::open(self.config.storage_path.clone()).await?;
        tracing::Span::current().record("backup", backup.name());

        let raw = match backup.tee(source).await {
            Ok(raw) => raw,
            Err(e) => {
                let err = AppError::from(e);
                tracing::error!(error = %err, "Failed to read submission");
                file_as_error(&mut backup).await;
                return Err(err);
            }
        };

        let message = match parse_message(&raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(backup = %backup.name(), error = %err, "Submission could not be parsed");
                file_as_error(&mut backup).await;
                return Err(err);
            }
        };
        let sender = message.sender.clone();

        let validator = self.validator.clone();
        let validation = match tokio::task::spawn_blocking(move || validator.validate(&message))
            .await
        {
            Ok(validation) => validation,
            Err(e) => {
                let err = AppError::Internal(format!("Validation task failed: {}", e));
                return Err(self.fail(&mut backup, &sender, err).await);
            }
        };

        match validation {
            Err(rejected) => {
                let messages = rejected.user_messages();
                tracing::info!(
                    backup = %backup.name(),
                    problems = ?rejected.problems,
                    "Submission rejected"
                );

                // The submitter still hears what was wrong with the message
                if let Err(e) = backup.move_to(BackupFolder::Invalid).await {
                    tracing::error!(
                        backup = %backup.name(),
                        error = %e,
                        "Failed to move raw backup to invalid"
                    );
                    file_as_error(&mut backup).await;
                }

                if let Err(e) = self
                    .notifier
                    .notify_errors(&sender, &rejected.subject, &messages)
                    .await
                {
                    tracing::error!(error = %e, "Failed to send rejection reply");
                }

                Ok(SubmitOutcome::Rejected { messages })
            }
            Ok(valid) => {
                let subject = valid.subject.clone();
                let mut compensations = CompensationStack::new();

                let (id, token) = match self
                    .commit(&mut backup, &sender, valid, &mut compensations)
                    .await
                {
                    Ok(committed) => committed,
                    Err(err) => {
                        compensations
                            .unwind(&self.entries, self.storage.as_ref(), &err)
                            .await;
                        return Err(self.fail(&mut backup, &sender, err).await);
                    }
                };

                let delete_link = self.config.delete_link(&token);
                if let Err(e) = self
                    .notifier
                    .notify_success(&sender, &subject, &delete_link)
                    .await
                {
                    tracing::error!(
                        entry_id = id,
                        error = %e,
                        "Failed to send success reply; submission stays committed"
                    );
                }

                tracing::info!(entry_id = id, "Submission accepted");
                Ok(SubmitOutcome::Accepted { id, token })
            }
        }
    }

    /// Commit steps after validation. Each successful step pushes its compensation.
    async fn commit(
        &self,
        backup: &mut RawBackup,
        sender: &Sender,
        valid: ValidatedSubmission,
        compensations: &mut CompensationStack,
    ) -> Result<(EntryId, String), AppError> {
        let id = self.entries.next_id().await?;

        let entry = Entry {
            id,
            from_name: sender.name.clone(),
            from_address: sender.address.clone(),
            subject: valid.subject,
            text: valid.text,
            extension: valid.extension,
            created: Utc::now(),
        };
        self.entries.create_entry(&entry).await?;
        compensations.push(Compensation::RemoveEntry(id));

        let key = image_key(id, &entry.extension);
        self.storage
            .upload_with_key(&key, valid.image, content_type_for_extension(&entry.extension))
            .await?;
        compensations.push(Compensation::DeleteObject(key));

        let token = self.entries.issue_token(id).await?;

        backup.commit(id).await?;

        Ok((id, token))
    }

    /// Failure path once the sender is known: file the backup as `error` and send the
    /// generic internal-error reply. Returns the original error.
    async fn fail(&self, backup: &mut RawBackup, sender: &Sender, err: AppError) -> AppError {
        tracing::error!(
            backup = %backup.name(),
            error = %err.detailed_message(),
            "Submission failed"
        );

        file_as_error(backup).await;

        let messages = [INTERNAL_ERROR_MESSAGE.to_string()];
        if let Err(e) = self
            .notifier
            .notify_errors(sender, INTERNAL_ERROR_SUBJECT, &messages)
            .await
        {
            tracing::error!(error = %e, original_error = %err, "Failed to send internal error reply");
        }

        err
    }
}

async fn file_as_error(backup: &mut RawBackup) {
    if let Err(e) = backup.move_to(BackupFolder::Error).await {
        tracing::error!(
            backup = %backup.name(),
            folder = %backup.folder(),
            error = %e,
            "Failed to move raw backup to error"
        );
    }
}
