//! Mailimage metadata store
//!
//! Entry records, the identity counter and delete tokens live in a key-value store.
//! `EntryRepository` is the allocator the pipeline and the read paths talk to; the
//! `MetadataStore` trait is the boundary to the concrete backend.

pub mod db;

pub use db::{
    create_metadata_store, generate_token, EntryRepository, MemoryMetadataStore, MetadataStore,
    RedisMetadataStore,
};
