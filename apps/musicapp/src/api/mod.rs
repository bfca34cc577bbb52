//! JSON API endpoint handlers.

pub mod auth;
pub mod library;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};

use crate::middleware;
use crate::AppState;

/// Routes mounted under `/api`. Everything but login requires a principal.
pub fn routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/albums", get(library::list_albums))
        .route("/albums/:id", get(library::get_album))
        .route("/songs", get(library::list_songs))
        .layer(axum_mw::from_fn(middleware::require_auth));

    Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected)
}
