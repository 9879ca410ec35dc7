//! Catalog repository contract shared by every storage backend.
//!
//! # Responsibility
//! - Define the single data-access surface used by services.
//! - Define semantic errors (`NotFound`, `Conflict`) on top of transport
//!   errors, so callers never inspect backend-specific failures.
//!
//! # Invariants
//! - Writes validate entities before touching storage.
//! - List reads are deterministic: entity lists by ascending id, playlist
//!   tracks by playlist position, reviews by insertion order.
//! - Every backend passes the same behavioural contract.

use crate::db::DbError;
use crate::model::catalog::{Album, AlbumId, Artist, ArtistId, Genre, Track, TrackId};
use crate::model::listener::{NewUser, Review, User, UserId};
use crate::model::playlist::{PlayList, PlaylistId};
use crate::model::validation::ModelValidationError;
use rand::seq::IndexedRandom;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifies the entity a `RepoError::NotFound` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    Track(TrackId),
    Artist(ArtistId),
    Album(AlbumId),
    Playlist(PlaylistId),
    User(String),
}

impl Display for EntityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Track(id) => write!(f, "track {id}"),
            Self::Artist(id) => write!(f, "artist {id}"),
            Self::Album(id) => write!(f, "album {id}"),
            Self::Playlist(id) => write!(f, "playlist {id}"),
            Self::User(name) => write!(f, "user `{name}`"),
        }
    }
}

/// Repository error for catalog persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound(EntityKey),
    /// Write collides with an existing unique key.
    Conflict(String),
    /// Persisted state cannot be mapped back to the domain model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "{key} not found"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract for the music catalog.
///
/// Object safe, so configuration can pick a backend at runtime and hand it
/// out as `Box<dyn CatalogRepository>`.
pub trait CatalogRepository {
    /// Registers a user. Duplicate (normalized) names are a `Conflict`.
    fn add_user(&mut self, user: &NewUser) -> RepoResult<User>;
    /// Looks a user up by name, ignoring case and surrounding whitespace.
    fn get_user(&self, user_name: &str) -> RepoResult<Option<User>>;
    fn get_user_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Inserts or replaces a track and upserts its artist, album and genres.
    fn add_track(&mut self, track: &Track) -> RepoResult<()>;
    fn get_track(&self, id: TrackId) -> RepoResult<Option<Track>>;
    fn get_tracks(&self) -> RepoResult<Vec<Track>>;
    fn get_number_of_tracks(&self) -> RepoResult<usize>;
    fn get_tracks_by_artist(&self, artist_id: ArtistId) -> RepoResult<Vec<Track>>;
    /// Returns known tracks in request order; unknown and repeated ids are skipped.
    fn get_tracks_by_ids(&self, ids: &[TrackId]) -> RepoResult<Vec<Track>>;
    /// Exact genre name match, ignoring ASCII case.
    fn get_track_ids_by_genre(&self, genre_name: &str) -> RepoResult<Vec<TrackId>>;
    /// Substring search over title, artist, album and genre names.
    ///
    /// Blank queries return no tracks.
    fn search_tracks(&self, query: &str) -> RepoResult<Vec<Track>>;

    fn add_artist(&mut self, artist: &Artist) -> RepoResult<()>;
    fn get_artist(&self, id: ArtistId) -> RepoResult<Option<Artist>>;
    fn get_artists(&self) -> RepoResult<Vec<Artist>>;

    fn add_album(&mut self, album: &Album) -> RepoResult<()>;
    fn get_album(&self, id: AlbumId) -> RepoResult<Option<Album>>;
    fn get_albums(&self) -> RepoResult<Vec<Album>>;
    fn get_number_of_albums(&self) -> RepoResult<usize>;

    fn add_genre(&mut self, genre: &Genre) -> RepoResult<()>;
    fn get_genres(&self) -> RepoResult<Vec<Genre>>;
    fn get_number_of_genres(&self) -> RepoResult<usize>;

    /// Stores a review; the reviewed track must exist.
    fn add_review(&mut self, review: &Review) -> RepoResult<()>;
    fn get_reviews(&self, track_id: TrackId) -> RepoResult<Vec<Review>>;

    /// Stores a new playlist with its tracks. Existing ids are a `Conflict`.
    fn add_playlist(&mut self, playlist: &PlayList) -> RepoResult<()>;
    fn get_playlist(&self, id: PlaylistId) -> RepoResult<Option<PlayList>>;
    fn get_playlists(&self) -> RepoResult<Vec<PlayList>>;
    /// Appends a track; a track already present is left where it is.
    fn add_track_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()>;
    /// Removes a track; absent tracks are ignored.
    fn remove_track_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()>;
    /// Smallest id greater than every stored playlist id, or 0.
    fn next_playlist_id(&self) -> RepoResult<PlaylistId>;
    /// Creates and stores a playlist of distinct random tracks.
    fn create_random_playlist(&mut self, length: usize) -> RepoResult<PlayList>;
}

/// Draws up to `length` distinct ids uniformly at random.
pub(crate) fn pick_random_track_ids(
    track_ids: &[TrackId],
    length: usize,
) -> RepoResult<Vec<TrackId>> {
    if length == 0 {
        return Err(ModelValidationError::EmptyRandomPlaylist.into());
    }
    let mut rng = rand::rng();
    Ok(track_ids
        .choose_multiple(&mut rng, length.min(track_ids.len()))
        .copied()
        .collect())
}

/// ASCII-lowercased, trimmed search needle; `None` for blank input.
pub(crate) fn search_needle(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}
