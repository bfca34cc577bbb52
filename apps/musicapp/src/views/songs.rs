//! Song views

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::db::{
    models::{Album, NewSong, SongEntry, SongFilter},
    queries,
};
use crate::error::{AppError, Result};
use crate::forms::{FormErrors, SongForm, AUDIO_FILE_TYPES};
use crate::middleware::Session;
use crate::services::media::{new_blob_path, release_blobs, BlobKind};
use crate::AppState;

use super::albums::AlbumDetailTemplate;
use super::auth::LoginTemplate;

const DUPLICATE_SONG: &str = "You already added that song.";
const BAD_AUDIO_TYPE: &str = "Audio file must be WAV, MP3, OGG or M4A";

#[derive(Template)]
#[template(path = "pages/create_song.html")]
pub struct CreateSongTemplate {
    pub album: Album,
    pub name: String,
    pub errors: FormErrors,
    pub error_message: Option<String>,
}

impl CreateSongTemplate {
    fn rejected(
        album: Album,
        name: String,
        errors: FormErrors,
        message: Option<&str>,
    ) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Self {
                album,
                name,
                errors,
                error_message: message.map(str::to_string),
            },
        )
            .into_response()
    }
}

#[derive(Template)]
#[template(path = "pages/songs.html")]
pub struct SongsTemplate {
    pub songs: Vec<SongEntry>,
    pub filter_by: String,
}

/// Render the song upload form for an album
pub async fn create_song_page(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
) -> Result<CreateSongTemplate> {
    let db = state.db.lock().await;
    let album = queries::get_album(&db, album_id)?;
    Ok(CreateSongTemplate {
        album,
        name: String::new(),
        errors: FormErrors::new(),
        error_message: None,
    })
}

/// Handle song upload into an album
pub async fn create_song(
    State(state): State<AppState>,
    Path(album_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response> {
    let album = {
        let db = state.db.lock().await;
        queries::get_album(&db, album_id)?
    };

    let valid = match SongForm::from_multipart(multipart).await?.validate() {
        Ok(valid) => valid,
        Err((name, errors)) => {
            return Ok(CreateSongTemplate::rejected(album, name, errors, None))
        }
    };

    let taken = {
        let db = state.db.lock().await;
        let songs = queries::list_songs_for_album(&db, album_id)?;
        queries::song_name_taken(&songs, &valid.name)
    };
    if taken {
        return Ok(CreateSongTemplate::rejected(
            album,
            valid.name,
            FormErrors::new(),
            Some(DUPLICATE_SONG),
        ));
    }

    let Some(extension) = valid.audio.allowed_extension(AUDIO_FILE_TYPES) else {
        tracing::debug!(file_name = %valid.audio.file_name, "Rejected audio extension");
        return Ok(CreateSongTemplate::rejected(
            album,
            valid.name,
            FormErrors::new(),
            Some(BAD_AUDIO_TYPE),
        ));
    };

    let audio_path = new_blob_path(BlobKind::Audio, &extension);
    state.media().put(&audio_path, &valid.audio.data).await?;

    let new_song = NewSong {
        album_id,
        name: valid.name,
        audio_path: audio_path.to_string_lossy().into_owned(),
    };

    let inserted = {
        let db = state.db.lock().await;
        queries::insert_song(&db, &new_song)
            .and_then(|song| Ok((song, queries::list_songs_for_album(&db, album_id)?)))
    };

    let (song, songs) = match inserted {
        Ok(inserted) => inserted,
        Err(e) => {
            release_blobs(state.media(), &[new_song.audio_path]).await;
            return match e {
                // Lost a race with a concurrent upload of the same name.
                AppError::Conflict(_) => Ok(CreateSongTemplate::rejected(
                    album,
                    new_song.name,
                    FormErrors::new(),
                    Some(DUPLICATE_SONG),
                )),
                e => Err(e),
            };
        }
    };

    tracing::info!(song_id = song.id, album_id, name = %song.name, "Song created");

    Ok(AlbumDetailTemplate { album, songs }.into_response())
}

/// Delete a song, then show its album
pub async fn delete_song(
    State(state): State<AppState>,
    Path((album_id, song_id)): Path<(i64, i64)>,
) -> Result<AlbumDetailTemplate> {
    let (album, songs, audio_path) = {
        let db = state.db.lock().await;
        let album = queries::get_album(&db, album_id)?;
        let audio_path = queries::delete_song(&db, song_id)?;
        let songs = queries::list_songs_for_album(&db, album_id)?;
        (album, songs, audio_path)
    };

    tracing::info!(song_id, album_id, "Song deleted");
    release_blobs(state.media(), &[audio_path]).await;

    Ok(AlbumDetailTemplate { album, songs })
}

/// Flip a song's favorite flag
pub async fn favorite(
    State(state): State<AppState>,
    Path(song_id): Path<i64>,
) -> Result<Json<Value>> {
    let db = state.db.lock().await;
    let is_favorite = queries::toggle_song_favorite(&db, song_id)?;
    tracing::debug!(song_id, is_favorite, "Song favorite toggled");
    Ok(Json(json!({ "success": true })))
}

/// The requester's songs across all albums, optionally only favorites
pub async fn songs(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(filter_by): Path<String>,
) -> Result<Response> {
    let Some(user_id) = session.user_id() else {
        return Ok(LoginTemplate::required().into_response());
    };

    let songs = {
        let db = state.db.lock().await;
        queries::list_user_songs(&db, user_id, SongFilter::from_keyword(&filter_by))?
    };

    Ok(SongsTemplate { songs, filter_by }.into_response())
}
