//! Image processing module
//!
//! - Decode checks for submitted images (processor)
//! - Thumbnail rendering (thumbnail)

pub mod processor;
pub mod thumbnail;

pub use processor::ImageProcessor;
pub use thumbnail::{ImageThumbnailer, ThumbnailRenderer};
