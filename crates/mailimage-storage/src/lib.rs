//! Mailimage Storage Library
//!
//! This crate provides the Content Store (image and thumbnail blobs) and the Raw Backup
//! lifecycle folders that hold the original bytes of every submission.
//!
//! # Storage key format
//!
//! All blobs live under the storage root:
//!
//! - **Images**: `images/{id}.{ext}`
//! - **Thumbnails**: `thumbnails/{id}.jpg`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so every caller derives the same path for an identity.

pub mod backup;
pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use backup::{BackupFolder, RawBackup};
pub use factory::create_storage;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageError, StorageResult};
