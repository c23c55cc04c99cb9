pub mod delete;
pub mod entries;
pub mod image;

use mailimage_core::{AppError, EntryId};

/// Split a `{id}.{ext}` path segment. Anything else is an unknown resource.
pub(crate) fn parse_file_name(file: &str) -> Result<(EntryId, &str), AppError> {
    file.split_once('.')
        .filter(|(_, ext)| !ext.is_empty())
        .and_then(|(id, ext)| id.parse::<EntryId>().ok().map(|id| (id, ext)))
        .ok_or_else(|| AppError::NotFound(format!("No such file: {}", file)))
}
