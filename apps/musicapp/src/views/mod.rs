//! HTML views
//!
//! Route handlers that render Askama templates for the browser frontend.
//! Every handler sees the request's `Session`, put there by the session
//! middleware.

pub mod albums;
pub mod auth;
pub mod songs;

use askama::Template;
use axum::{
    http::{StatusCode, Uri},
    middleware as axum_mw,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::middleware;
use crate::AppState;

#[derive(Template)]
#[template(path = "pages/404.html")]
pub struct NotFoundTemplate {
    pub path: String,
}

/// 404 handler
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            path: uri.path().to_string(),
        },
    )
}

/// Build the HTML routes for the frontend
pub fn routes() -> Router<AppState> {
    let login_required = Router::new()
        .route("/", get(albums::index))
        .layer(axum_mw::from_fn(middleware::require_login));

    Router::new()
        .merge(login_required)
        // Accounts
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        // Albums
        .route(
            "/albums/new",
            get(albums::create_album_page).post(albums::create_album),
        )
        .route("/albums/:album_id", get(albums::detail))
        .route(
            "/albums/:album_id/delete",
            post(albums::delete_album).delete(albums::delete_album),
        )
        .route("/albums/:album_id/favorite", post(albums::favorite_album))
        // Songs
        .route(
            "/albums/:album_id/songs/new",
            get(songs::create_song_page).post(songs::create_song),
        )
        .route(
            "/albums/:album_id/songs/:song_id/delete",
            post(songs::delete_song).delete(songs::delete_song),
        )
        .route("/songs/:song_id/favorite", post(songs::favorite))
        .route("/songs/filter/:filter_by", get(songs::songs))
}
