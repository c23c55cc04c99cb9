use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use mailimage_core::EntrySummary;
use std::sync::Arc;

/// All published entries, newest first.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EntrySummary>>, HttpAppError> {
    let entries = state.gallery.list_entries().await?;
    tracing::debug!(count = entries.len(), "Listed entries");
    Ok(Json(entries))
}
