//! Browsing, search and review use-cases.
//!
//! # Responsibility
//! - Give browse/search callers typed "does not exist" errors instead of
//!   bare `Option`s.
//! - Stamp reviews with the current time before persisting them.
//!
//! # Invariants
//! - Never bypasses repository validation.
//! - Storage-agnostic: works over any `CatalogRepository`, including
//!   `Box<dyn CatalogRepository>` targets.

use crate::model::catalog::{Album, Artist, ArtistId, Genre, Track, TrackId};
use crate::model::listener::Review;
use crate::repo::catalog_repo::{CatalogRepository, EntityKey, RepoError, RepoResult};
use log::info;
use rand::seq::IndexedRandom;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service error for track use-cases.
#[derive(Debug)]
pub enum TrackServiceError {
    NonExistentTrack(TrackId),
    NonExistentArtist(ArtistId),
    Repo(RepoError),
}

impl Display for TrackServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonExistentTrack(id) => write!(f, "track {id} does not exist"),
            Self::NonExistentArtist(id) => write!(f, "artist {id} does not exist"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TrackServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TrackServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityKey::Track(id)) => Self::NonExistentTrack(id),
            RepoError::NotFound(EntityKey::Artist(id)) => Self::NonExistentArtist(id),
            other => Self::Repo(other),
        }
    }
}

pub type TrackServiceResult<T> = Result<T, TrackServiceError>;

/// Track/catalog facade over a borrowed repository.
pub struct TrackService<'r, R: CatalogRepository + ?Sized> {
    repo: &'r mut R,
}

impl<'r, R: CatalogRepository + ?Sized> TrackService<'r, R> {
    pub fn new(repo: &'r mut R) -> Self {
        Self { repo }
    }

    pub fn get_track(&self, id: TrackId) -> TrackServiceResult<Track> {
        self.repo
            .get_track(id)?
            .ok_or(TrackServiceError::NonExistentTrack(id))
    }

    pub fn get_tracks(&self) -> RepoResult<Vec<Track>> {
        self.repo.get_tracks()
    }

    pub fn get_number_of_tracks(&self) -> RepoResult<usize> {
        self.repo.get_number_of_tracks()
    }

    pub fn get_tracks_by_ids(&self, ids: &[TrackId]) -> RepoResult<Vec<Track>> {
        self.repo.get_tracks_by_ids(ids)
    }

    pub fn get_track_ids_by_genre(&self, genre_name: &str) -> RepoResult<Vec<TrackId>> {
        self.repo.get_track_ids_by_genre(genre_name)
    }

    /// Lists an artist's tracks; unknown artists are an error, not an empty list.
    pub fn get_tracks_by_artist(&self, artist_id: ArtistId) -> TrackServiceResult<Vec<Track>> {
        self.get_artist(artist_id)?;
        Ok(self.repo.get_tracks_by_artist(artist_id)?)
    }

    pub fn get_artist(&self, id: ArtistId) -> TrackServiceResult<Artist> {
        self.repo
            .get_artist(id)?
            .ok_or(TrackServiceError::NonExistentArtist(id))
    }

    pub fn search_tracks(&self, query: &str) -> RepoResult<Vec<Track>> {
        self.repo.search_tracks(query)
    }

    /// Posts a review for an existing track, timestamped now.
    pub fn add_review(
        &mut self,
        track_id: TrackId,
        review_text: &str,
        rating: u8,
    ) -> TrackServiceResult<Review> {
        self.get_track(track_id)?;
        let review = Review::new(track_id, review_text, rating, now_epoch_ms());
        self.repo.add_review(&review)?;
        info!("event=review_post module=service status=ok track_id={track_id} rating={rating}");
        Ok(review)
    }

    pub fn get_reviews(&self, track_id: TrackId) -> TrackServiceResult<Vec<Review>> {
        self.get_track(track_id)?;
        Ok(self.repo.get_reviews(track_id)?)
    }

    /// Artists sorted by name.
    pub fn get_artists(&self) -> RepoResult<Vec<Artist>> {
        let mut artists = self.repo.get_artists()?;
        artists.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(artists)
    }

    /// Genres sorted by name.
    pub fn get_genres(&self) -> RepoResult<Vec<Genre>> {
        let mut genres = self.repo.get_genres()?;
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    /// Albums sorted by title.
    pub fn get_albums(&self) -> RepoResult<Vec<Album>> {
        let mut albums = self.repo.get_albums()?;
        albums.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(albums)
    }

    pub fn get_number_of_genres(&self) -> RepoResult<usize> {
        self.repo.get_number_of_genres()
    }

    pub fn get_number_of_albums(&self) -> RepoResult<usize> {
        self.repo.get_number_of_albums()
    }

    /// Picks up to `count` distinct tracks for sidebar-style suggestions.
    pub fn get_random_tracks(&self, count: usize) -> RepoResult<Vec<Track>> {
        let tracks = self.repo.get_tracks()?;
        let mut rng = rand::rng();
        Ok(tracks
            .choose_multiple(&mut rng, count.min(tracks.len()))
            .cloned()
            .collect())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
