//! Mailimage Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! all Mailimage components.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use backend::MetadataBackend;
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Entry, EntryId, EntrySummary, Sender};
