pub mod entry;

pub use entry::{Entry, EntryId, EntrySummary, Sender};
