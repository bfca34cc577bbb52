use serde::{Deserialize, Serialize};

/// Filter keyword that restricts the song listing to favorites.
pub const FAVORITES_FILTER: &str = "favorites";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub cover_path: String,
    pub is_favorite: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub album_id: i64,
    pub name: String,
    pub audio_path: String,
    pub is_favorite: bool,
    pub created_at: String,
}

/// A song joined with the album it belongs to, as shown in song listings.
#[derive(Debug, Clone, Serialize)]
pub struct SongEntry {
    #[serde(flatten)]
    pub song: Song,
    pub album_title: String,
    pub album_artist: String,
    pub album_cover_path: String,
}

/// Album fields ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub user_id: i64,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub cover_path: String,
}

/// Song fields ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub album_id: i64,
    pub name: String,
    pub audio_path: String,
}

/// Which subset of a user's songs to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongFilter {
    All,
    Favorites,
}

impl SongFilter {
    /// Any keyword other than `favorites` means the unfiltered listing.
    pub fn from_keyword(keyword: &str) -> Self {
        if keyword == FAVORITES_FILTER {
            SongFilter::Favorites
        } else {
            SongFilter::All
        }
    }
}

impl std::fmt::Display for SongFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongFilter::All => write!(f, "all"),
            SongFilter::Favorites => write!(f, "favorites"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_filter_keywords() {
        assert_eq!(SongFilter::from_keyword("favorites"), SongFilter::Favorites);
        assert_eq!(SongFilter::from_keyword("all"), SongFilter::All);
        assert_eq!(SongFilter::from_keyword("Favorites"), SongFilter::All);
        assert_eq!(SongFilter::from_keyword(""), SongFilter::All);
    }
}
