//! In-memory catalog repository.
//!
//! # Responsibility
//! - Provide a dependency-free backend for tests and throwaway sessions.
//! - Mirror the relational backend's observable behaviour exactly.
//!
//! # Invariants
//! - Records are kept normalized (tracks hold ids, not copies) in `Vec`s
//!   sorted by id. Lookups by primary id binary-search those `Vec`s; every
//!   other query is a linear scan with no secondary indexes.
//! - Stored names are trimmed, matching the relational backend.
//! - Nested entities are hydrated from current records on every read.

use crate::model::catalog::{Album, AlbumId, Artist, ArtistId, Genre, GenreId, Track, TrackId};
use crate::model::listener::{normalize_user_name, NewUser, Review, User, UserId};
use crate::model::playlist::{random_playlist_name, PlayList, PlaylistId};
use crate::repo::catalog_repo::{
    pick_random_track_ids, search_needle, CatalogRepository, EntityKey, RepoError, RepoResult,
};
use log::debug;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
struct TrackRecord {
    id: TrackId,
    title: String,
    duration_secs: Option<u32>,
    url: Option<String>,
    artist_id: Option<ArtistId>,
    album_id: Option<AlbumId>,
    genre_ids: Vec<GenreId>,
}

#[derive(Debug, Clone)]
struct PlaylistRecord {
    id: PlaylistId,
    name: String,
    track_ids: Vec<TrackId>,
}

/// Linear-scan catalog store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogRepository {
    users: Vec<User>,
    artists: Vec<Artist>,
    albums: Vec<Album>,
    genres: Vec<Genre>,
    tracks: Vec<TrackRecord>,
    reviews: Vec<Review>,
    playlists: Vec<PlaylistRecord>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn hydrate_track(&self, record: &TrackRecord) -> RepoResult<Track> {
        let dangling = |kind: &str, id: u32| {
            RepoError::InvalidData(format!(
                "track {} references missing {kind} {id}",
                record.id
            ))
        };

        let artist = match record.artist_id {
            Some(id) => Some(
                find_by_id(&self.artists, id, |a| a.id)
                    .cloned()
                    .ok_or_else(|| dangling("artist", id))?,
            ),
            None => None,
        };
        let album = match record.album_id {
            Some(id) => Some(
                find_by_id(&self.albums, id, |a| a.id)
                    .cloned()
                    .ok_or_else(|| dangling("album", id))?,
            ),
            None => None,
        };
        let mut genres = Vec::with_capacity(record.genre_ids.len());
        for id in &record.genre_ids {
            let genre = find_by_id(&self.genres, *id, |g| g.id)
                .cloned()
                .ok_or_else(|| dangling("genre", *id))?;
            genres.push(genre);
        }

        Ok(Track {
            id: record.id,
            title: record.title.clone(),
            duration_secs: record.duration_secs,
            url: record.url.clone(),
            artist,
            album,
            genres,
        })
    }

    fn hydrate_playlist(&self, record: &PlaylistRecord) -> RepoResult<PlayList> {
        let mut playlist = PlayList::new(record.id, record.name.clone());
        for track_id in &record.track_ids {
            let stored = self.track_record(*track_id).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "playlist {} references missing track {track_id}",
                    record.id
                ))
            })?;
            playlist.tracks.push(self.hydrate_track(stored)?);
        }
        Ok(playlist)
    }

    fn track_record(&self, id: TrackId) -> Option<&TrackRecord> {
        find_by_id(&self.tracks, id, |t| t.id)
    }

    fn playlist_record_mut(&mut self, id: PlaylistId) -> RepoResult<&mut PlaylistRecord> {
        self.playlists
            .iter_mut()
            .find(|playlist| playlist.id == id)
            .ok_or(RepoError::NotFound(EntityKey::Playlist(id)))
    }

    fn hydrate_all<'a>(
        &self,
        records: impl Iterator<Item = &'a TrackRecord>,
    ) -> RepoResult<Vec<Track>> {
        records.map(|record| self.hydrate_track(record)).collect()
    }

    fn insert_playlist(&mut self, playlist: &PlayList) -> RepoResult<()> {
        playlist.validate()?;
        if self.playlists.iter().any(|stored| stored.id == playlist.id) {
            return Err(RepoError::Conflict(format!(
                "playlist {} already exists",
                playlist.id
            )));
        }
        for track in &playlist.tracks {
            if self.track_record(track.id).is_none() {
                return Err(RepoError::NotFound(EntityKey::Track(track.id)));
            }
        }

        upsert_sorted(
            &mut self.playlists,
            PlaylistRecord {
                id: playlist.id,
                name: playlist.stored_name().to_string(),
                track_ids: playlist.track_ids(),
            },
            |p| p.id,
        );
        debug!(
            "event=playlist_add module=repo backend=memory status=ok playlist_id={} tracks={}",
            playlist.id,
            playlist.size()
        );
        Ok(())
    }
}

impl CatalogRepository for MemoryCatalogRepository {
    fn add_user(&mut self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;
        let user_name = normalize_user_name(&user.user_name);
        if self.users.iter().any(|stored| stored.user_name == user_name) {
            return Err(RepoError::Conflict(format!(
                "user name `{user_name}` is already taken"
            )));
        }

        let id = self.users.iter().map(|stored| stored.id).max().unwrap_or(0) + 1;
        let stored = NewUser::new(&user_name, user.password_hash.clone()).into_user(id);
        self.users.push(stored.clone());
        debug!("event=user_add module=repo backend=memory status=ok user_id={id}");
        Ok(stored)
    }

    fn get_user(&self, user_name: &str) -> RepoResult<Option<User>> {
        let user_name = normalize_user_name(user_name);
        Ok(self
            .users
            .iter()
            .find(|user| user.user_name == user_name)
            .cloned())
    }

    fn get_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.iter().find(|user| user.id == id).cloned())
    }

    fn add_track(&mut self, track: &Track) -> RepoResult<()> {
        track.validate()?;
        let track = track.normalized();

        if let Some(artist) = &track.artist {
            upsert_sorted(&mut self.artists, artist.clone(), |a| a.id);
        }
        if let Some(album) = &track.album {
            upsert_sorted(&mut self.albums, album.clone(), |a| a.id);
        }
        for genre in &track.genres {
            upsert_sorted(&mut self.genres, genre.clone(), |g| g.id);
        }

        upsert_sorted(
            &mut self.tracks,
            TrackRecord {
                id: track.id,
                title: track.title.clone(),
                duration_secs: track.duration_secs,
                url: track.url.clone(),
                artist_id: track.artist.as_ref().map(|artist| artist.id),
                album_id: track.album.as_ref().map(|album| album.id),
                genre_ids: track.genre_ids(),
            },
            |t| t.id,
        );
        debug!(
            "event=track_merge module=repo backend=memory status=ok track_id={}",
            track.id
        );
        Ok(())
    }

    fn get_track(&self, id: TrackId) -> RepoResult<Option<Track>> {
        self.track_record(id)
            .map(|record| self.hydrate_track(record))
            .transpose()
    }

    fn get_tracks(&self) -> RepoResult<Vec<Track>> {
        self.hydrate_all(self.tracks.iter())
    }

    fn get_number_of_tracks(&self) -> RepoResult<usize> {
        Ok(self.tracks.len())
    }

    fn get_tracks_by_artist(&self, artist_id: ArtistId) -> RepoResult<Vec<Track>> {
        self.hydrate_all(
            self.tracks
                .iter()
                .filter(|record| record.artist_id == Some(artist_id)),
        )
    }

    fn get_tracks_by_ids(&self, ids: &[TrackId]) -> RepoResult<Vec<Track>> {
        let mut seen = BTreeSet::new();
        self.hydrate_all(
            ids.iter()
                .filter(|id| seen.insert(**id))
                .filter_map(|id| self.track_record(*id)),
        )
    }

    fn get_track_ids_by_genre(&self, genre_name: &str) -> RepoResult<Vec<TrackId>> {
        let wanted = genre_name.trim();
        let genre_ids: BTreeSet<GenreId> = self
            .genres
            .iter()
            .filter(|genre| genre.name.eq_ignore_ascii_case(wanted))
            .map(|genre| genre.id)
            .collect();

        Ok(self
            .tracks
            .iter()
            .filter(|record| record.genre_ids.iter().any(|id| genre_ids.contains(id)))
            .map(|record| record.id)
            .collect())
    }

    fn search_tracks(&self, query: &str) -> RepoResult<Vec<Track>> {
        let Some(needle) = search_needle(query) else {
            return Ok(Vec::new());
        };

        let mut hits = Vec::new();
        for record in &self.tracks {
            let track = self.hydrate_track(record)?;
            if track.matches_lowercase(&needle) {
                hits.push(track);
            }
        }
        Ok(hits)
    }

    fn add_artist(&mut self, artist: &Artist) -> RepoResult<()> {
        artist.validate()?;
        upsert_sorted(&mut self.artists, artist.normalized(), |a| a.id);
        Ok(())
    }

    fn get_artist(&self, id: ArtistId) -> RepoResult<Option<Artist>> {
        Ok(find_by_id(&self.artists, id, |a| a.id).cloned())
    }

    fn get_artists(&self) -> RepoResult<Vec<Artist>> {
        Ok(self.artists.clone())
    }

    fn add_album(&mut self, album: &Album) -> RepoResult<()> {
        album.validate()?;
        upsert_sorted(&mut self.albums, album.normalized(), |a| a.id);
        Ok(())
    }

    fn get_album(&self, id: AlbumId) -> RepoResult<Option<Album>> {
        Ok(find_by_id(&self.albums, id, |a| a.id).cloned())
    }

    fn get_albums(&self) -> RepoResult<Vec<Album>> {
        Ok(self.albums.clone())
    }

    fn get_number_of_albums(&self) -> RepoResult<usize> {
        Ok(self.albums.len())
    }

    fn add_genre(&mut self, genre: &Genre) -> RepoResult<()> {
        genre.validate()?;
        upsert_sorted(&mut self.genres, genre.normalized(), |g| g.id);
        Ok(())
    }

    fn get_genres(&self) -> RepoResult<Vec<Genre>> {
        Ok(self.genres.clone())
    }

    fn get_number_of_genres(&self) -> RepoResult<usize> {
        Ok(self.genres.len())
    }

    fn add_review(&mut self, review: &Review) -> RepoResult<()> {
        review.validate()?;
        if self.track_record(review.track_id).is_none() {
            return Err(RepoError::NotFound(EntityKey::Track(review.track_id)));
        }
        self.reviews.push(review.clone());
        Ok(())
    }

    fn get_reviews(&self, track_id: TrackId) -> RepoResult<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|review| review.track_id == track_id)
            .cloned()
            .collect())
    }

    fn add_playlist(&mut self, playlist: &PlayList) -> RepoResult<()> {
        self.insert_playlist(playlist)
    }

    fn get_playlist(&self, id: PlaylistId) -> RepoResult<Option<PlayList>> {
        self.playlists
            .iter()
            .find(|playlist| playlist.id == id)
            .map(|record| self.hydrate_playlist(record))
            .transpose()
    }

    fn get_playlists(&self) -> RepoResult<Vec<PlayList>> {
        self.playlists
            .iter()
            .map(|record| self.hydrate_playlist(record))
            .collect()
    }

    fn add_track_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()> {
        if self.track_record(track_id).is_none() {
            return Err(RepoError::NotFound(EntityKey::Track(track_id)));
        }
        let playlist = self.playlist_record_mut(playlist_id)?;
        if !playlist.track_ids.contains(&track_id) {
            playlist.track_ids.push(track_id);
        }
        Ok(())
    }

    fn remove_track_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()> {
        let playlist = self.playlist_record_mut(playlist_id)?;
        playlist.track_ids.retain(|id| *id != track_id);
        Ok(())
    }

    fn next_playlist_id(&self) -> RepoResult<PlaylistId> {
        // `playlists` is sorted by id, so the last record holds the maximum.
        let Some(last) = self.playlists.last() else {
            return Ok(0);
        };
        last.id.checked_add(1).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "playlist id {} out of range",
                u64::from(last.id) + 1
            ))
        })
    }

    fn create_random_playlist(&mut self, length: usize) -> RepoResult<PlayList> {
        let all_ids: Vec<TrackId> = self.tracks.iter().map(|record| record.id).collect();
        let picked = pick_random_track_ids(&all_ids, length)?;

        let id = self.next_playlist_id()?;
        let mut playlist = PlayList::new(id, random_playlist_name(id));
        for track_id in picked {
            if let Some(record) = self.track_record(track_id) {
                playlist.add_track(self.hydrate_track(record)?);
            }
        }

        self.insert_playlist(&playlist)?;
        Ok(playlist)
    }
}

/// Binary search over a slice kept sorted by `key`.
fn find_by_id<T, K: Ord>(items: &[T], id: K, key: impl Fn(&T) -> K) -> Option<&T> {
    items
        .binary_search_by(|item| key(item).cmp(&id))
        .ok()
        .map(|index| &items[index])
}

fn upsert_sorted<T, K: Ord>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let id = key(&item);
    match items.binary_search_by(|existing| key(existing).cmp(&id)) {
        Ok(index) => items[index] = item,
        Err(index) => items.insert(index, item),
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryCatalogRepository;
    use crate::model::catalog::{Artist, Track};
    use crate::repo::catalog_repo::CatalogRepository;

    #[test]
    fn renamed_artist_is_visible_through_existing_tracks() {
        let mut repo = MemoryCatalogRepository::new();
        let mut track = Track::new(2, "Food");
        track.artist = Some(Artist::new(1, "AWOL"));
        repo.add_track(&track).unwrap();

        repo.add_artist(&Artist::new(1, "A Way Of Life")).unwrap();

        let loaded = repo.get_track(2).unwrap().unwrap();
        assert_eq!(loaded.artist.unwrap().full_name, "A Way Of Life");
    }

    #[test]
    fn tracks_stay_sorted_by_id_regardless_of_insert_order() {
        let mut repo = MemoryCatalogRepository::new();
        for id in [5, 1, 3] {
            repo.add_track(&Track::new(id, format!("track {id}"))).unwrap();
        }
        let ids: Vec<_> = repo.get_tracks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn id_lookups_find_records_inserted_out_of_order() {
        let mut repo = MemoryCatalogRepository::new();
        for id in [9, 2, 7, 4] {
            repo.add_artist(&Artist::new(id, format!("artist {id}"))).unwrap();
        }
        for id in [9, 2, 7, 4] {
            assert_eq!(repo.get_artist(id).unwrap().unwrap().full_name, format!("artist {id}"));
        }
        assert!(repo.get_artist(5).unwrap().is_none());
        assert!(repo.get_artist(10).unwrap().is_none());
    }
}
