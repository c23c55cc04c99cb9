//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::entries::list_entries))
        .route("/image/{file}", get(handlers::image::get_image))
        .route("/thumbnail/{file}", get(handlers::image::get_thumbnail))
        .route("/delete/{token}", get(handlers::delete::delete_entry))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
