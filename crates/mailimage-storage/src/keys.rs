//! Shared key generation for the content store.

use mailimage_core::EntryId;

pub const IMAGES_DIR: &str = "images";
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Extension every thumbnail is encoded with.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Storage key of the image of an entry: `images/{id}.{ext}`.
pub fn image_key(id: EntryId, extension: &str) -> String {
    format!("{}/{}.{}", IMAGES_DIR, id, extension.trim_start_matches('.'))
}

/// Storage key of the thumbnail of an entry: `thumbnails/{id}.jpg`.
pub fn thumbnail_key(id: EntryId) -> String {
    format!("{}/{}.{}", THUMBNAILS_DIR, id, THUMBNAIL_EXTENSION)
}

/// Content type served for a stored image extension.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
