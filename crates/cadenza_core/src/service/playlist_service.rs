//! Playlist use-cases.
//!
//! # Invariants
//! - Playlist names are unique (case-insensitive) across the repository,
//!   generated random playlist names included.
//! - New playlists take `CatalogRepository::next_playlist_id()`.

use crate::model::catalog::TrackId;
use crate::model::playlist::{random_playlist_name, PlayList, PlaylistId};
use crate::repo::catalog_repo::{CatalogRepository, EntityKey, RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for playlist use-cases.
#[derive(Debug)]
pub enum PlaylistServiceError {
    /// Another playlist already uses this name.
    TitleNotUnique(String),
    PlaylistNotFound(PlaylistId),
    TrackNotFound(TrackId),
    Repo(RepoError),
}

impl Display for PlaylistServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleNotUnique(name) => write!(f, "playlist name `{name}` is already used"),
            Self::PlaylistNotFound(id) => write!(f, "playlist {id} not found"),
            Self::TrackNotFound(id) => write!(f, "track {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlaylistServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PlaylistServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityKey::Playlist(id)) => Self::PlaylistNotFound(id),
            RepoError::NotFound(EntityKey::Track(id)) => Self::TrackNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type PlaylistServiceResult<T> = Result<T, PlaylistServiceError>;

/// Playlist facade over a borrowed repository.
pub struct PlaylistService<'r, R: CatalogRepository + ?Sized> {
    repo: &'r mut R,
}

impl<'r, R: CatalogRepository + ?Sized> PlaylistService<'r, R> {
    pub fn new(repo: &'r mut R) -> Self {
        Self { repo }
    }

    /// Creates an empty playlist with a unique name.
    pub fn add_playlist(&mut self, name: &str) -> PlaylistServiceResult<PlayList> {
        let name = name.trim();
        self.ensure_name_available(name)?;

        let playlist = PlayList::new(self.repo.next_playlist_id()?, name);
        self.repo.add_playlist(&playlist)?;
        info!(
            "event=playlist_create module=service status=ok playlist_id={}",
            playlist.id
        );
        Ok(playlist)
    }

    pub fn get_playlists(&self) -> RepoResult<Vec<PlayList>> {
        self.repo.get_playlists()
    }

    pub fn get_playlist(&self, id: PlaylistId) -> PlaylistServiceResult<PlayList> {
        self.repo
            .get_playlist(id)?
            .ok_or(PlaylistServiceError::PlaylistNotFound(id))
    }

    /// Appends a track and returns the updated playlist.
    pub fn add_track_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> PlaylistServiceResult<PlayList> {
        self.repo.add_track_to_playlist(playlist_id, track_id)?;
        self.get_playlist(playlist_id)
    }

    pub fn remove_track_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> PlaylistServiceResult<PlayList> {
        self.repo.remove_track_from_playlist(playlist_id, track_id)?;
        self.get_playlist(playlist_id)
    }

    pub fn create_random_playlist(&mut self, length: usize) -> PlaylistServiceResult<PlayList> {
        let name = random_playlist_name(self.repo.next_playlist_id()?);
        self.ensure_name_available(&name)?;

        let playlist = self.repo.create_random_playlist(length)?;
        info!(
            "event=playlist_create module=service status=ok playlist_id={} kind=random tracks={}",
            playlist.id,
            playlist.size()
        );
        Ok(playlist)
    }

    fn ensure_name_available(&self, name: &str) -> PlaylistServiceResult<()> {
        let taken = self
            .repo
            .get_playlists()?
            .iter()
            .any(|playlist| playlist.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(PlaylistServiceError::TitleNotUnique(name.to_string()));
        }
        Ok(())
    }
}
