//! Playlist aggregate.
//!
//! # Invariants
//! - Track order is significant and preserved by every backend.
//! - A track appears at most once per playlist.

use crate::model::catalog::{Track, TrackId};
use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type PlaylistId = u32;

/// Named, ordered list of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayList {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl PlayList {
    pub fn new(id: PlaylistId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            tracks: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn first_track(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// Appends a track unless it is already listed.
    ///
    /// Returns `true` when the track was appended.
    pub fn add_track(&mut self, track: Track) -> bool {
        if self.contains(track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Removes a track by id. Returns `true` when it was present.
    pub fn remove_track(&mut self, track_id: TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|track| track.id != track_id);
        self.tracks.len() != before
    }

    /// Returns the track at `index`, or `None` when out of bounds.
    pub fn select_track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.iter().any(|track| track.id == track_id)
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|track| track.id).collect()
    }

    /// Playlist name as backends store it.
    pub fn stored_name(&self) -> &str {
        self.name.trim()
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.name, "playlist", "name")?;
        let mut seen = BTreeSet::new();
        for track in &self.tracks {
            if !seen.insert(track.id) {
                return Err(ModelValidationError::DuplicatePlaylistTrack(track.id));
            }
        }
        Ok(())
    }
}

/// Name used for generated random playlists.
pub fn random_playlist_name(id: PlaylistId) -> String {
    format!("Random Playlist #{id}")
}

#[cfg(test)]
mod tests {
    use super::{random_playlist_name, PlayList};
    use crate::model::catalog::Track;
    use crate::model::validation::ModelValidationError;

    #[test]
    fn add_track_ignores_duplicates_and_keeps_order() {
        let mut playlist = PlayList::new(1, " Mixtape ");
        assert_eq!(playlist.name, "Mixtape");

        assert!(playlist.add_track(Track::new(3, "Three")));
        assert!(playlist.add_track(Track::new(1, "One")));
        assert!(!playlist.add_track(Track::new(3, "Three")));

        assert_eq!(playlist.track_ids(), vec![3, 1]);
        assert_eq!(playlist.first_track().map(|t| t.id), Some(3));
    }

    #[test]
    fn select_and_remove_track() {
        let mut playlist = PlayList::new(1, "Mixtape");
        playlist.add_track(Track::new(3, "Three"));
        playlist.add_track(Track::new(4, "Four"));

        assert_eq!(playlist.select_track(1).map(|t| t.id), Some(4));
        assert!(playlist.select_track(2).is_none());

        assert!(playlist.remove_track(3));
        assert!(!playlist.remove_track(3));
        assert_eq!(playlist.size(), 1);
    }

    #[test]
    fn validate_rejects_blank_name_and_duplicate_tracks() {
        let blank = PlayList::new(0, "  ");
        assert!(blank.validate().is_err());

        let mut doubled = PlayList::new(0, "Twice");
        doubled.tracks = vec![Track::new(1, "One"), Track::new(1, "One")];
        assert_eq!(
            doubled.validate(),
            Err(ModelValidationError::DuplicatePlaylistTrack(1))
        );
    }

    #[test]
    fn random_playlist_name_includes_id() {
        assert_eq!(random_playlist_name(4), "Random Playlist #4");
    }
}
