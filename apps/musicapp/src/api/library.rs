//! Read-only JSON view of the caller's library.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{
    models::{Album, Song, SongEntry, SongFilter},
    queries,
};
use crate::error::Result;
use crate::middleware::Principal;
use crate::AppState;

/// An album together with its songs.
#[derive(Debug, Serialize)]
pub struct AlbumDetail {
    #[serde(flatten)]
    pub album: Album,
    pub songs: Vec<Song>,
}

/// Query parameters for the song listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListSongsQuery {
    pub filter: Option<String>,
}

/// GET /api/albums
pub async fn list_albums(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Album>>> {
    let db = state.db.lock().await;
    let albums = queries::list_albums_for_user(&db, principal.user_id)?;
    Ok(Json(albums))
}

/// GET /api/albums/:id
///
/// Like the HTML detail page, any authenticated caller may read any album.
pub async fn get_album(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
) -> Result<Json<AlbumDetail>> {
    let db = state.db.lock().await;
    let album = queries::get_album(&db, album_id)?;
    let songs = queries::list_songs_for_album(&db, album_id)?;
    Ok(Json(AlbumDetail { album, songs }))
}

/// GET /api/songs?filter=favorites|all
pub async fn list_songs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListSongsQuery>,
) -> Result<Json<Vec<SongEntry>>> {
    let filter = query
        .filter
        .as_deref()
        .map(SongFilter::from_keyword)
        .unwrap_or(SongFilter::All);

    let db = state.db.lock().await;
    let songs = queries::list_user_songs(&db, principal.user_id, filter)?;
    Ok(Json(songs))
}
