//! Mailimage API Library
//!
//! Read-only HTTP surface over published entries: the listing, image and thumbnail
//! fetches, and deletion through the link sent to the submitter.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use setup::routes::setup_routes;
pub use setup::server::start_server;
pub use state::AppState;
