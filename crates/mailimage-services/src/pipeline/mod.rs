//! Submission commit pipeline
//!
//! A submission is committed across the metadata store, the content store and the raw
//! backup folders. Each successful commit step pushes its undo action onto a
//! `CompensationStack`; a later failure unwinds the stack in reverse order.

mod compensation;
mod submission;

pub use compensation::{Compensation, CompensationStack};
pub use submission::{SubmissionPipeline, SubmitOutcome};
