//! Catalog entities: tracks and the artists, albums and genres they reference.
//!
//! # Invariants
//! - Ids are assigned by the catalog source, never by a backend.
//! - Display names are stored trimmed and must not be empty.
//! - `Track::genres` holds each genre at most once, ordered by genre id.

use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type TrackId = u32;
pub type ArtistId = u32;
pub type AlbumId = u32;
pub type GenreId = u32;

/// Performing artist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub full_name: String,
}

impl Artist {
    pub fn new(id: ArtistId, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.full_name, "artist", "full_name")
    }

    /// Copy with the name trimmed, as backends store it.
    pub fn normalized(&self) -> Self {
        Self::new(self.id, self.full_name.as_str())
    }
}

/// Album or release a track belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    #[serde(default)]
    pub album_url: Option<String>,
    /// Free-form release kind (`Album`, `Single Tracks`, ...).
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl Album {
    pub fn new(id: AlbumId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into().trim().to_string(),
            album_url: None,
            album_type: None,
            release_year: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.title, "album", "title")
    }

    /// Copy with the title trimmed, as backends store it.
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

impl Genre {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.name, "genre", "name")
    }

    pub fn normalized(&self) -> Self {
        Self::new(self.id, self.name.as_str())
    }
}

/// Playable catalog entry.
///
/// Artist, album and genres are hydrated snapshots; repositories persist
/// only their ids as references and upsert the referenced records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Track length in whole seconds.
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub artist: Option<Artist>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Track {
    /// Creates a bare track with no artist, album or genres.
    pub fn new(id: TrackId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into().trim().to_string(),
            duration_secs: None,
            url: None,
            artist: None,
            album: None,
            genres: Vec::new(),
        }
    }

    /// Adds a genre, keeping the list ordered by id and free of duplicates.
    pub fn add_genre(&mut self, genre: Genre) {
        match self.genres.binary_search_by_key(&genre.id, |g| g.id) {
            Ok(_) => {}
            Err(index) => self.genres.insert(index, genre),
        }
    }

    /// Returns referenced genre ids in ascending order.
    pub fn genre_ids(&self) -> Vec<GenreId> {
        let ids: BTreeSet<GenreId> = self.genres.iter().map(|genre| genre.id).collect();
        ids.into_iter().collect()
    }

    /// Validates the track and every entity it references.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.title, "track", "title")?;
        if let Some(artist) = &self.artist {
            artist.validate()?;
        }
        if let Some(album) = &self.album {
            album.validate()?;
        }

        let mut seen = BTreeSet::new();
        for genre in &self.genres {
            genre.validate()?;
            if !seen.insert(genre.id) {
                return Err(ModelValidationError::DuplicateGenre(genre.id));
            }
        }
        Ok(())
    }

    /// Copy with every display name trimmed and genres ordered by id.
    ///
    /// Backends persist this form, so a track reads back the same from
    /// either of them however it was built (constructor, literal or serde).
    pub fn normalized(&self) -> Self {
        let mut track = Self {
            title: self.title.trim().to_string(),
            artist: self.artist.as_ref().map(Artist::normalized),
            album: self.album.as_ref().map(Album::normalized),
            genres: Vec::with_capacity(self.genres.len()),
            ..self.clone()
        };
        for genre in &self.genres {
            track.add_genre(genre.normalized());
        }
        track
    }

    /// ASCII case-insensitive substring match over title, artist, album and
    /// genre names.
    ///
    /// `needle` must already be ASCII-lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        if self.title.to_ascii_lowercase().contains(needle) {
            return true;
        }
        if let Some(artist) = &self.artist {
            if artist.full_name.to_ascii_lowercase().contains(needle) {
                return true;
            }
        }
        if let Some(album) = &self.album {
            if album.title.to_ascii_lowercase().contains(needle) {
                return true;
            }
        }
        self.genres
            .iter()
            .any(|genre| genre.name.to_ascii_lowercase().contains(needle))
    }
}
