//! Input validation for registration, album creation and song creation.
//!
//! Each form collects raw request fields, trims text the way browsers submit
//! it, and reports problems per field so the page can be re-rendered with
//! the user's input intact.

use axum::extract::Multipart;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{AppError, Result};

/// Accepted cover image extensions (compared lower-cased).
pub const IMAGE_FILE_TYPES: &[&str] = &["png", "jpg", "jpeg"];
/// Accepted audio extensions (compared lower-cased).
pub const AUDIO_FILE_TYPES: &[&str] = &["wav", "mp3", "ogg", "m4a"];

pub const ALBUM_TITLE_MAX: usize = 50;
pub const ALBUM_ARTIST_MAX: usize = 25;
pub const ALBUM_GENRE_MAX: usize = 10;
pub const SONG_NAME_MAX: usize = 50;
pub const USERNAME_MAX: usize = 150;

const REQUIRED: &str = "This field is required.";
const EMPTY_FILE: &str = "The submitted file is empty.";

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

// =============================================================================
// Errors
// =============================================================================

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// First message for a field, as shown next to the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }
}

// =============================================================================
// Shared field checks
// =============================================================================

/// Lower-cased text after the last `.` of a filename.
///
/// A name without a dot, or ending in one, has no extension.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

fn check_text(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return;
    }
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

fn check_upload(errors: &mut FormErrors, field: &str, upload: Option<&Upload>) {
    match upload {
        None => errors.add(field, REQUIRED),
        Some(upload) if upload.data.is_empty() => errors.add(field, EMPTY_FILE),
        Some(_) => {}
    }
}

// =============================================================================
// Multipart input
// =============================================================================

/// An uploaded file held in memory until it is stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

impl Upload {
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.file_name)
    }

    /// The lowercased extension, if it is one of `allowed`.
    pub fn allowed_extension(&self, allowed: &[&str]) -> Option<String> {
        self.extension()
            .filter(|ext| allowed.contains(&ext.as_str()))
    }
}

/// Text and file parts of a multipart body.
#[derive(Debug, Default)]
struct MultipartFields {
    text: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartFields {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                // An untouched file input arrives with an empty filename.
                Some(file_name) if file_name.is_empty() => {}
                Some(file_name) => {
                    let data = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read upload: {}", e))
                    })?;
                    fields.files.insert(
                        name,
                        Upload {
                            file_name,
                            data,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field: {}", e))
                    })?;
                    fields.text.insert(name, value);
                }
            }
        }

        Ok(fields)
    }

    fn text(&mut self, name: &str) -> String {
        self.text
            .remove(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

// =============================================================================
// Album
// =============================================================================

/// Text values of the album form, kept for re-rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlbumFields {
    pub title: String,
    pub artist: String,
    pub genre: String,
}

/// Album creation input as submitted.
#[derive(Debug, Clone, Default)]
pub struct AlbumForm {
    pub fields: AlbumFields,
    pub cover: Option<Upload>,
}

/// Album creation input that passed field validation.
#[derive(Debug, Clone)]
pub struct ValidAlbum {
    pub fields: AlbumFields,
    pub cover: Upload,
}

impl AlbumForm {
    pub async fn from_multipart(multipart: Multipart) -> Result<Self> {
        let mut parts = MultipartFields::read(multipart).await?;
        Ok(Self {
            fields: AlbumFields {
                title: parts.text("title"),
                artist: parts.text("artist"),
                genre: parts.text("genre"),
            },
            cover: parts.files.remove("cover"),
        })
    }

    pub fn validate(self) -> std::result::Result<ValidAlbum, (AlbumFields, FormErrors)> {
        let mut errors = FormErrors::new();
        check_text(&mut errors, "title", &self.fields.title, ALBUM_TITLE_MAX);
        check_text(&mut errors, "artist", &self.fields.artist, ALBUM_ARTIST_MAX);
        check_text(&mut errors, "genre", &self.fields.genre, ALBUM_GENRE_MAX);
        check_upload(&mut errors, "cover", self.cover.as_ref());

        match self.cover {
            Some(cover) if errors.is_empty() => Ok(ValidAlbum {
                fields: self.fields,
                cover,
            }),
            _ => Err((self.fields, errors)),
        }
    }
}

// =============================================================================
// Song
// =============================================================================

/// Song creation input as submitted.
#[derive(Debug, Clone, Default)]
pub struct SongForm {
    pub name: String,
    pub audio: Option<Upload>,
}

/// Song creation input that passed field validation.
#[derive(Debug, Clone)]
pub struct ValidSong {
    pub name: String,
    pub audio: Upload,
}

impl SongForm {
    pub async fn from_multipart(multipart: Multipart) -> Result<Self> {
        let mut parts = MultipartFields::read(multipart).await?;
        Ok(Self {
            name: parts.text("name"),
            audio: parts.files.remove("audio"),
        })
    }

    pub fn validate(self) -> std::result::Result<ValidSong, (String, FormErrors)> {
        let mut errors = FormErrors::new();
        check_text(&mut errors, "name", &self.name, SONG_NAME_MAX);
        check_upload(&mut errors, "audio", self.audio.as_ref());

        match self.audio {
            Some(audio) if errors.is_empty() => Ok(ValidSong {
                name: self.name,
                audio,
            }),
            _ => Err((self.name, errors)),
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Registration form (urlencoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    /// Field checks that need no database access; username uniqueness is
    /// checked by the caller.
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        let username = self.username.trim();
        check_text(&mut errors, "username", username, USERNAME_MAX);
        if !username.is_empty() && !USERNAME_RE.is_match(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, \
                 and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !EMAIL_RE.is_match(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }

        errors
    }

    pub fn username(&self) -> &str {
        self.username.trim()
    }

    /// Email as stored: `None` when left blank.
    pub fn email(&self) -> Option<&str> {
        Some(self.email.trim()).filter(|email| !email.is_empty())
    }
}

/// Login form (urlencoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
