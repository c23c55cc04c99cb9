//! Metadata repositories
//!
//! `store` defines the backend boundary, `redis_store` and `memory` implement it, and `entry`
//! holds the repository used by the services.
//
// Backend boundary and implementations
pub mod memory;
pub mod redis_store;
pub mod store;
//
// Repository and token generation
pub mod entry;
pub mod token;

pub use entry::EntryRepository;
pub use memory::MemoryMetadataStore;
pub use redis_store::RedisMetadataStore;
pub use store::{create_metadata_store, MetadataStore};
pub use token::generate_token;
