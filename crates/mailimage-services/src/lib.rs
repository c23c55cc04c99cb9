//! Mailimage Services Layer
//!
//! Business services built on the stores: the submission pipeline that commits a
//! submission across the metadata store, the content store and the raw backup folders,
//! the lazy thumbnail cache, the read/delete paths, and the reply notifiers. Keep
//! coordination here; keep thin HTTP and CLI handling in their crates.

pub mod gallery;
pub mod notify;
pub mod pipeline;
pub mod thumbnail;

pub use gallery::Gallery;
pub use notify::{create_notifier, Notifier, Reply, ReplyComposer, SmtpNotifier, StdoutNotifier};
pub use pipeline::{Compensation, CompensationStack, SubmissionPipeline, SubmitOutcome};
pub use thumbnail::ThumbnailCache;

pub use mailimage_db::{create_metadata_store, EntryRepository, MetadataStore};
pub use mailimage_processing::{ImageThumbnailer, ThumbnailRenderer};
pub use mailimage_storage::{create_storage, LocalStorage, MemoryStorage, Storage, StorageError};
