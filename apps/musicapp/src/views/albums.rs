//! Album views

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::db::{
    models::{Album, NewAlbum, Song},
    queries,
};
use crate::error::Result;
use crate::forms::{AlbumFields, AlbumForm, FormErrors, IMAGE_FILE_TYPES};
use crate::middleware::{Principal, Session};
use crate::services::media::{new_blob_path, release_blobs, BlobKind};
use crate::AppState;

use super::auth::LoginTemplate;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub albums: Vec<Album>,
}

#[derive(Template)]
#[template(path = "pages/album_detail.html")]
pub struct AlbumDetailTemplate {
    pub album: Album,
    pub songs: Vec<Song>,
}

#[derive(Template)]
#[template(path = "pages/create_album.html")]
pub struct CreateAlbumTemplate {
    pub album: AlbumFields,
    pub errors: FormErrors,
    pub error_message: Option<String>,
}

impl CreateAlbumTemplate {
    fn rejected(album: AlbumFields, errors: FormErrors, error_message: Option<&str>) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Self {
                album,
                errors,
                error_message: error_message.map(str::to_string),
            },
        )
            .into_response()
    }
}

/// Album listing for the logged-in user
pub async fn index(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<IndexTemplate> {
    let db = state.db.lock().await;
    let albums = queries::list_albums_for_user(&db, principal.user_id)?;
    Ok(IndexTemplate { albums })
}

/// Album page with its songs
pub async fn detail(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
) -> Result<AlbumDetailTemplate> {
    let db = state.db.lock().await;
    let album = queries::get_album(&db, album_id)?;
    let songs = queries::list_songs_for_album(&db, album_id)?;
    Ok(AlbumDetailTemplate { album, songs })
}

/// Render the album creation form
pub async fn create_album_page(Extension(session): Extension<Session>) -> Response {
    if session.principal().is_none() {
        return LoginTemplate::required().into_response();
    }

    CreateAlbumTemplate {
        album: AlbumFields::default(),
        errors: FormErrors::new(),
        error_message: None,
    }
    .into_response()
}

/// Handle album creation
pub async fn create_album(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Response> {
    let Some(principal) = session.principal() else {
        return Ok(LoginTemplate::required().into_response());
    };

    let valid = match AlbumForm::from_multipart(multipart).await?.validate() {
        Ok(valid) => valid,
        Err((album, errors)) => return Ok(CreateAlbumTemplate::rejected(album, errors, None)),
    };

    let Some(extension) = valid.cover.allowed_extension(IMAGE_FILE_TYPES) else {
        tracing::debug!(file_name = %valid.cover.file_name, "Rejected cover extension");
        return Ok(CreateAlbumTemplate::rejected(
            valid.fields,
            FormErrors::new(),
            Some("Image must be PNG, JPG, or JPEG"),
        ));
    };

    let cover_path = new_blob_path(BlobKind::Cover, &extension);
    state.media().put(&cover_path, &valid.cover.data).await?;
    let cover_path = cover_path.to_string_lossy().into_owned();

    let new_album = NewAlbum {
        user_id: principal.user_id,
        title: valid.fields.title,
        artist: valid.fields.artist,
        genre: valid.fields.genre,
        cover_path,
    };

    let inserted = {
        let db = state.db.lock().await;
        queries::insert_album(&db, &new_album)
    };
    let album = match inserted {
        Ok(album) => album,
        Err(e) => {
            release_blobs(state.media(), &[new_album.cover_path]).await;
            return Err(e);
        }
    };

    tracing::info!(
        album_id = album.id,
        user_id = principal.user_id,
        title = %album.title,
        "Album created"
    );

    Ok(AlbumDetailTemplate {
        album,
        songs: Vec::new(),
    }
    .into_response())
}

/// Delete an album and its songs, then show the requester's remaining albums
pub async fn delete_album(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(album_id): Path<i64>,
) -> Result<IndexTemplate> {
    let (blobs, albums) = {
        let db = state.db.lock().await;
        let blobs = queries::delete_album(&db, album_id)?;
        let albums = match session.user_id() {
            Some(user_id) => queries::list_albums_for_user(&db, user_id)?,
            None => Vec::new(),
        };
        (blobs, albums)
    };

    tracing::info!(album_id, user_id = ?session.user_id(), "Album deleted");
    release_blobs(state.media(), &blobs).await;

    Ok(IndexTemplate { albums })
}

/// Flip an album's favorite flag
pub async fn favorite_album(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
) -> Result<Json<Value>> {
    let db = state.db.lock().await;
    let is_favorite = queries::toggle_album_favorite(&db, album_id)?;
    tracing::debug!(album_id, is_favorite, "Album favorite toggled");
    Ok(Json(json!({ "success": true })))
}
