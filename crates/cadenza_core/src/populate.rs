//! Catalog seeding.
//!
//! # Responsibility
//! - Load a parsed catalog (`CatalogSeed`) into any repository backend.
//! - Create the featured "Developers' picks" playlist from the seed.
//!
//! # Invariants
//! - Load order is artists, tracks, albums, genres, then the featured
//!   playlist, so every reference resolves when it is written.
//! - Parsing raw source files (CSV exports and the like) happens upstream;
//!   this module only accepts the already-structured seed or its JSON form.

use crate::model::catalog::{Album, Artist, Genre, Track, TrackId};
use crate::model::playlist::{PlayList, PlaylistId};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const FEATURED_PLAYLIST_ID: PlaylistId = 0;
pub const FEATURED_PLAYLIST_NAME: &str = "Developers' picks";

/// Structured catalog used to populate a fresh repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Tracks placed in the featured playlist, in order.
    #[serde(default)]
    pub featured_track_ids: Vec<TrackId>,
}

impl CatalogSeed {
    pub fn from_json_str(json: &str) -> Result<Self, PopulateError> {
        serde_json::from_str(json).map_err(PopulateError::Parse)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PopulateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| PopulateError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_json_str(&raw)
    }
}

#[derive(Debug)]
pub enum PopulateError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Repo(RepoError),
}

impl Display for PopulateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read catalog seed `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid catalog seed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PopulateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PopulateError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Counts of records written by [`populate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub artists: usize,
    pub tracks: usize,
    pub albums: usize,
    pub genres: usize,
    pub featured_tracks: usize,
}

/// Writes the whole seed into `repo` and creates the featured playlist.
///
/// Featured ids that do not name a seeded track are skipped with a warning.
///
/// # Errors
/// - Any repository error, including a `Conflict` when the featured
///   playlist id is already taken.
pub fn populate<R: CatalogRepository + ?Sized>(
    repo: &mut R,
    seed: &CatalogSeed,
) -> Result<PopulateReport, PopulateError> {
    let started_at = Instant::now();
    info!("event=populate module=populate status=start");

    for artist in &seed.artists {
        repo.add_artist(artist)?;
    }
    for track in &seed.tracks {
        repo.add_track(track)?;
    }
    for album in &seed.albums {
        repo.add_album(album)?;
    }
    for genre in &seed.genres {
        repo.add_genre(genre)?;
    }

    let mut featured = PlayList::new(FEATURED_PLAYLIST_ID, FEATURED_PLAYLIST_NAME);
    for track in repo.get_tracks_by_ids(&seed.featured_track_ids)? {
        featured.add_track(track);
    }
    let skipped = seed.featured_track_ids.len() - featured.size();
    if skipped > 0 {
        warn!("event=populate module=populate status=partial skipped_featured_ids={skipped}");
    }
    repo.add_playlist(&featured)?;

    let report = PopulateReport {
        artists: seed.artists.len(),
        tracks: seed.tracks.len(),
        albums: seed.albums.len(),
        genres: seed.genres.len(),
        featured_tracks: featured.size(),
    };
    info!(
        "event=populate module=populate status=ok duration_ms={} artists={} tracks={} albums={} genres={} featured={}",
        started_at.elapsed().as_millis(),
        report.artists,
        report.tracks,
        report.albums,
        report.genres,
        report.featured_tracks
    );
    Ok(report)
}

/// Seeds `repo` only when it holds no tracks yet.
///
/// Returns `None` when the repository was left untouched.
pub fn populate_if_empty<R: CatalogRepository + ?Sized>(
    repo: &mut R,
    seed: &CatalogSeed,
) -> Result<Option<PopulateReport>, PopulateError> {
    if repo.get_number_of_tracks()? > 0 {
        info!("event=populate module=populate status=skipped reason=not_empty");
        return Ok(None);
    }
    populate(repo, seed).map(Some)
}
