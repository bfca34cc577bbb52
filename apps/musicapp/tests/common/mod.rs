//! Test infrastructure for musicapp integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` with helpers
//! for seeding users, albums and songs, minting session cookies and building
//! upload forms.

#![allow(dead_code)]

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderName, HeaderValue,
};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

use musicapp::config::{Config, DatabaseConfig, MediaConfig, ServerConfig};
use musicapp::db::{
    self,
    models::{Album, NewAlbum, NewSong, Song},
    queries,
};
use musicapp::services::{AuthService, BlobStore, LocalBlobStore};
use musicapp::{build_router, AppState};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    db: Arc<Mutex<Connection>>,
    auth_service: Arc<AuthService>,
    media: Arc<LocalBlobStore>,
    // Keeps the media root alive for the duration of the test.
    _media_dir: TempDir,
}

impl TestApp {
    /// Create a new test application with an in-memory database and a
    /// temporary media root, served through the production router.
    pub async fn new() -> Self {
        let media_dir = TempDir::new().expect("Failed to create media dir");

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                jwt_secret: Some(TEST_JWT_SECRET.to_string()),
                secure_cookies: false,
            },
            database: DatabaseConfig {
                path: ":memory:".into(),
            },
            media: MediaConfig {
                root: media_dir.path().to_path_buf(),
                max_upload_mb: 5,
            },
        };

        let conn = db::init_db_memory().expect("Failed to initialize test database");
        let media = Arc::new(LocalBlobStore::new(media_dir.path().to_path_buf()));
        let state = AppState::new(
            config,
            conn,
            AuthService::new(TEST_JWT_SECRET.to_string()),
            media.clone(),
        );

        let db = Arc::clone(&state.db);
        let auth_service = Arc::clone(&state.auth_service);
        let server = TestServer::new(build_router(state)).expect("Failed to create test server");

        Self {
            server,
            db,
            auth_service,
            media,
            _media_dir: media_dir,
        }
    }

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Database handle for seeding and verifying state.
    pub fn db(&self) -> &Arc<Mutex<Connection>> {
        &self.db
    }

    pub fn media(&self) -> &LocalBlobStore {
        &self.media
    }

    pub fn media_root(&self) -> &Path {
        self.media.root()
    }

    /// Create an active user and return its id.
    pub async fn create_test_user(&self, username: &str, password: &str) -> i64 {
        let password_hash = self
            .auth_service
            .hash_password(password)
            .expect("Failed to hash password");

        let db = self.db.lock().await;
        queries::insert_user(&db, username, None, &password_hash)
            .expect("Failed to create test user")
    }

    pub async fn deactivate_user(&self, user_id: i64) {
        let db = self.db.lock().await;
        db.execute("UPDATE users SET is_active = 0 WHERE id = ?1", [user_id])
            .expect("Failed to deactivate user");
    }

    pub async fn delete_user(&self, user_id: i64) {
        let db = self.db.lock().await;
        db.execute("DELETE FROM users WHERE id = ?1", [user_id])
            .expect("Failed to delete user");
    }

    pub fn get_auth_token(&self, user_id: i64, username: &str) -> String {
        self.auth_service
            .create_token(user_id, username)
            .expect("Failed to create token")
    }

    /// Cookie header carrying a session for the given user.
    pub fn session_cookie(&self, user_id: i64, username: &str) -> (HeaderName, HeaderValue) {
        let token = self.get_auth_token(user_id, username);
        (
            COOKIE,
            HeaderValue::from_str(&format!("session={}", token)).expect("Invalid cookie"),
        )
    }

    /// Authorization header for JSON API requests.
    pub fn auth_header(&self, token: &str) -> (HeaderName, HeaderValue) {
        (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid token format"),
        )
    }

    /// Create a user and return its id with a session cookie header.
    pub async fn login_as(&self, username: &str) -> (i64, (HeaderName, HeaderValue)) {
        let user_id = self.create_test_user(username, "password123").await;
        (user_id, self.session_cookie(user_id, username))
    }

    /// Insert an album owned by `user_id`, with a real cover blob.
    pub async fn seed_album(&self, user_id: i64, title: &str) -> Album {
        let cover_path = format!("covers/{}-{}.png", user_id, title.replace(' ', "_"));
        self.media
            .put(Path::new(&cover_path), b"\x89PNG fake cover")
            .await
            .expect("Failed to write cover");

        let db = self.db.lock().await;
        queries::insert_album(
            &db,
            &NewAlbum {
                user_id,
                title: title.to_string(),
                artist: "Test Artist".to_string(),
                genre: "Rock".to_string(),
                cover_path,
            },
        )
        .expect("Failed to seed album")
    }

    /// Insert a song into `album_id`, with a real audio blob.
    pub async fn seed_song(&self, album_id: i64, name: &str, favorite: bool) -> Song {
        let audio_path = format!("audio/{}-{}.mp3", album_id, name.replace(' ', "_"));
        self.media
            .put(Path::new(&audio_path), b"ID3 fake audio")
            .await
            .expect("Failed to write audio");

        let db = self.db.lock().await;
        let song = queries::insert_song(
            &db,
            &NewSong {
                album_id,
                name: name.to_string(),
                audio_path,
            },
        )
        .expect("Failed to seed song");

        if favorite {
            queries::toggle_song_favorite(&db, song.id).expect("Failed to favorite song");
            queries::get_song(&db, song.id).expect("Failed to reload song")
        } else {
            song
        }
    }

    pub async fn count(&self, table: &str) -> i64 {
        let db = self.db.lock().await;
        db.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .expect("Failed to count rows")
    }

    /// Number of files stored under a media subdirectory.
    pub fn stored_files(&self, dir: &str) -> usize {
        std::fs::read_dir(self.media_root().join(dir))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Multipart body for the album creation form.
pub fn album_form(title: &str, artist: &str, genre: &str, cover_name: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("artist", artist.to_string())
        .add_text("genre", genre.to_string())
        .add_part(
            "cover",
            Part::bytes(b"\x89PNG cover bytes".to_vec()).file_name(cover_name.to_string()),
        )
}

/// Multipart body for the song upload form.
pub fn song_form(name: &str, file_name: &str) -> MultipartForm {
    MultipartForm::new().add_text("name", name.to_string()).add_part(
        "audio",
        Part::bytes(b"ID3 audio bytes".to_vec()).file_name(file_name.to_string()),
    )
}
