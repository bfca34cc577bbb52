//! File serving: embedded stylesheets and uploaded media.
//!
//! Static assets are compiled into the binary with rust-embed; media blobs
//! are read from the configured blob store.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use crate::error::Result;
use crate::AppState;

#[derive(RustEmbed)]
#[folder = "static/"]
pub struct StaticAssets;

fn file_response(path: &str, data: Vec<u8>, cache_control: &'static str) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, cache_control.to_string()),
        ],
        Body::from(data),
    )
        .into_response()
}

/// Serve embedded static files at /static/*path
pub async fn serve_static(Path(path): Path<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(content) => file_response(
            &path,
            content.data.into_owned(),
            "public, max-age=31536000, immutable",
        ),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Serve stored covers and audio at /media/*path
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let data = state.media().get(std::path::Path::new(&path)).await?;
    Ok(file_response(&path, data, "private, max-age=3600"))
}
