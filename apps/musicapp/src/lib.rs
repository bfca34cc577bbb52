//! musicapp library
//!
//! A personal music library: users keep albums with cover art, upload songs
//! into them and mark favorites. The binary serves it over HTTP; the modules
//! are exposed here for integration tests.

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    response::Json,
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod services;
pub mod static_files;
pub mod views;

use config::Config;
use services::{AuthService, BlobStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Connection>>,
    pub auth_service: Arc<AuthService>,
    pub media: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        conn: Connection,
        auth_service: AuthService,
        media: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(Mutex::new(conn)),
            auth_service: Arc::new(auth_service),
            media,
        }
    }

    /// Get a reference to the auth service.
    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }

    /// Get a reference to the blob store holding covers and audio.
    pub fn media(&self) -> &dyn BlobStore {
        self.media.as_ref()
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
}

pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "musicapp is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Assembles every route with the session and tracing layers.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.media.max_upload_bytes();

    Router::new()
        .route("/health", get(health_check))
        .route("/static/*path", get(static_files::serve_static))
        .route("/media/*path", get(static_files::serve_media))
        .nest("/api", api::routes())
        .merge(views::routes())
        .fallback(views::not_found)
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
