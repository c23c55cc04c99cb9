//! Mailimage processing
//!
//! Turns raw submission bytes into a structured message, validates it, and renders
//! thumbnails. Nothing in this crate touches a store; callers run the CPU-bound parts
//! on blocking threads.

pub mod image;
pub mod message;
pub mod validator;

pub use crate::image::{ImageProcessor, ImageThumbnailer, ThumbnailRenderer};
pub use message::{parse_message, Attachment, ParsedMessage};
pub use validator::{RejectedSubmission, SubmissionProblem, SubmissionValidator, ValidatedSubmission};
