use super::parse_file_name;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use mailimage_core::AppError;
use std::sync::Arc;

const THUMBNAIL_SUFFIX: &str = ".jpg";
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub async fn get_image(
    Path(file): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (id, extension) = parse_file_name(&file)?;
    let (data, content_type) = state.gallery.get_image(id, extension).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        data,
    ))
}

pub async fn get_thumbnail(
    Path(file): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = file
        .strip_suffix(THUMBNAIL_SUFFIX)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| AppError::NotFound(format!("No such thumbnail: {}", file)))?;

    let data = state.thumbnails.get_thumbnail(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        data,
    ))
}
