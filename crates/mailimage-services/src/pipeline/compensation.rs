use mailimage_core::{AppError, EntryId};
use mailimage_db::EntryRepository;
use mailimage_storage::Storage;
use std::fmt;

/// Undo action for one committed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Revoke an entry record (and any token issued for it)
    RemoveEntry(EntryId),
    /// Delete a content store object
    DeleteObject(String),
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::RemoveEntry(id) => write!(f, "remove entry {}", id),
            Compensation::DeleteObject(key) => write!(f, "delete object {}", key),
        }
    }
}

/// Compensations of one pipeline invocation, in commit order.
#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every compensation, newest first.
    ///
    /// A failing compensation is logged next to `cause` and the rest still run. Returns the
    /// number of compensations that failed.
    pub async fn unwind(
        self,
        entries: &EntryRepository,
        storage: &dyn Storage,
        cause: &AppError,
    ) -> usize {
        let mut failed = 0;

        for action in self.actions.into_iter().rev() {
            let result = match &action {
                Compensation::RemoveEntry(id) => entries.revoke(*id).await,
                Compensation::DeleteObject(key) => {
                    storage.delete(key).await.map_err(AppError::from)
                }
            };

            match result {
                Ok(()) => {
                    tracing::info!(compensation = %action, "Compensation applied");
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        compensation = %action,
                        error = %e,
                        original_error = %cause,
                        "Compensation failed"
                    );
                }
            }
        }

        failed
    }
}
