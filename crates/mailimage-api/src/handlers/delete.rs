use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Delete the entry behind a delete link, then redirect to the configured page.
pub async fn delete_entry(
    Path(token): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let id = state.gallery.delete_by_token(&token).await?;
    tracing::info!(entry_id = id, "Entry deleted through delete link");

    let response = match &state.config.delete_redirect_url {
        Some(url) => (StatusCode::FOUND, [(header::LOCATION, url.clone())]).into_response(),
        None => (StatusCode::OK, "The entry was deleted.").into_response(),
    };
    Ok(response)
}
