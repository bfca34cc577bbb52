//! Queries over users, albums and songs.
//!
//! Every function takes a borrowed connection so callers decide how long the
//! database lock is held.

use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Album, NewAlbum, NewSong, Song, SongEntry, SongFilter, User};
use crate::error::{AppError, Result};

const ALBUM_COLUMNS: &str =
    "id, user_id, title, artist, genre, cover_path, is_favorite, created_at";
const SONG_COLUMNS: &str = "id, album_id, name, audio_path, is_favorite, created_at";

// =============================================================================
// Users
// =============================================================================

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash, is_active, created_at
             FROM users WHERE username = ?1",
            [username],
            map_user_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<User> {
    conn.query_row(
        "SELECT id, username, email, password_hash, is_active, created_at
         FROM users WHERE id = ?1",
        [user_id],
        map_user_row,
    )
    .map_err(|e| not_found_or(e, "User not found"))
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Inserts an active user and returns its id.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    )?;
    Ok(conn.last_insert_rowid())
}

// =============================================================================
// Albums
// =============================================================================

/// All albums owned by `user_id`, in storage order.
pub fn list_albums_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Album>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALBUM_COLUMNS} FROM albums WHERE user_id = ?1 ORDER BY id"
    ))?;
    let albums = stmt
        .query_map([user_id], map_album_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(albums)
}

pub fn get_album(conn: &Connection, album_id: i64) -> Result<Album> {
    conn.query_row(
        &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
        [album_id],
        map_album_row,
    )
    .map_err(|e| not_found_or(e, "Album not found"))
}

pub fn insert_album(conn: &Connection, album: &NewAlbum) -> Result<Album> {
    conn.execute(
        "INSERT INTO albums (user_id, title, artist, genre, cover_path)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            album.user_id,
            album.title,
            album.artist,
            album.genre,
            album.cover_path
        ],
    )?;
    get_album(conn, conn.last_insert_rowid())
}

/// Deletes an album and, by cascade, its songs.
///
/// Returns the blob paths that were referenced by the deleted rows.
pub fn delete_album(conn: &Connection, album_id: i64) -> Result<Vec<String>> {
    let album = get_album(conn, album_id)?;

    let mut blobs = vec![album.cover_path];
    blobs.extend(
        list_songs_for_album(conn, album_id)?
            .into_iter()
            .map(|song| song.audio_path),
    );

    conn.execute("DELETE FROM albums WHERE id = ?1", [album_id])?;
    Ok(blobs)
}

/// Flips the album's favorite flag and returns the new value.
pub fn toggle_album_favorite(conn: &Connection, album_id: i64) -> Result<bool> {
    conn.query_row(
        "UPDATE albums SET is_favorite = NOT is_favorite WHERE id = ?1 RETURNING is_favorite",
        [album_id],
        |row| row.get(0),
    )
    .map_err(|e| not_found_or(e, "Album not found"))
}

// =============================================================================
// Songs
// =============================================================================

pub fn list_songs_for_album(conn: &Connection, album_id: i64) -> Result<Vec<Song>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SONG_COLUMNS} FROM songs WHERE album_id = ?1 ORDER BY id"
    ))?;
    let songs = stmt
        .query_map([album_id], map_song_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(songs)
}

/// Exact, case-sensitive name match against an album's existing songs.
pub fn song_name_taken(songs: &[Song], name: &str) -> bool {
    songs.iter().any(|song| song.name == name)
}

pub fn get_song(conn: &Connection, song_id: i64) -> Result<Song> {
    conn.query_row(
        &format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?1"),
        [song_id],
        map_song_row,
    )
    .map_err(|e| not_found_or(e, "Song not found"))
}

/// Inserts a song. A name already used in the album yields `AppError::Conflict`.
pub fn insert_song(conn: &Connection, song: &NewSong) -> Result<Song> {
    conn.execute(
        "INSERT INTO songs (album_id, name, audio_path) VALUES (?1, ?2, ?3)",
        params![song.album_id, song.name, song.audio_path],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict(format!("Song '{}' already exists in album", song.name))
        }
        _ => AppError::Sqlite(e),
    })?;
    get_song(conn, conn.last_insert_rowid())
}

/// Deletes a song and returns the blob path it referenced.
pub fn delete_song(conn: &Connection, song_id: i64) -> Result<String> {
    let song = get_song(conn, song_id)?;
    conn.execute("DELETE FROM songs WHERE id = ?1", [song_id])?;
    Ok(song.audio_path)
}

/// Flips the song's favorite flag and returns the new value.
pub fn toggle_song_favorite(conn: &Connection, song_id: i64) -> Result<bool> {
    conn.query_row(
        "UPDATE songs SET is_favorite = NOT is_favorite WHERE id = ?1 RETURNING is_favorite",
        [song_id],
        |row| row.get(0),
    )
    .map_err(|e| not_found_or(e, "Song not found"))
}

/// Every song on every album owned by `user_id`, optionally only favorites.
pub fn list_user_songs(
    conn: &Connection,
    user_id: i64,
    filter: SongFilter,
) -> Result<Vec<SongEntry>> {
    let favorites_only = filter == SongFilter::Favorites;

    let mut stmt = conn.prepare(
        r#"
        SELECT s.id, s.album_id, s.name, s.audio_path, s.is_favorite, s.created_at,
               a.title, a.artist, a.cover_path
        FROM songs s
        JOIN albums a ON a.id = s.album_id
        WHERE a.user_id = ?1 AND (?2 = 0 OR s.is_favorite = 1)
        ORDER BY s.id
        "#,
    )?;

    let songs = stmt
        .query_map(params![user_id, favorites_only], |row| {
            Ok(SongEntry {
                song: map_song_row(row)?,
                album_title: row.get(6)?,
                album_artist: row.get(7)?,
                album_cover_path: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(songs)
}

// =============================================================================
// Row mapping
// =============================================================================

fn not_found_or(err: rusqlite::Error, what: &str) -> AppError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(what.to_string()),
        _ => AppError::Sqlite(err),
    }
}

fn map_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        genre: row.get(4)?,
        cover_path: row.get(5)?,
        is_favorite: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        album_id: row.get(1)?,
        name: row.get(2)?,
        audio_path: row.get(3)?,
        is_favorite: row.get(4)?,
        created_at: row.get(5)?,
    })
}
