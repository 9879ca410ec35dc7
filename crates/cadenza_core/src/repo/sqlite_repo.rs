//! SQLite-backed catalog repository.
//!
//! # Responsibility
//! - Map catalog entities onto the relational schema from `db::migrations`.
//! - Leave indexing, joins and atomicity to SQLite.
//!
//! # Invariants
//! - Multi-statement writes (track merge, playlist insert, random playlist)
//!   run inside a single transaction.
//! - Track merges use `ON CONFLICT .. DO UPDATE`, never `REPLACE`, so rows
//!   referencing a track (reviews, playlist entries) survive a merge.
//! - Read paths reject rows that cannot be mapped back to the domain model.
//! - Names are trimmed before they are written.

use crate::db::{open_db, open_db_in_memory};
use crate::model::catalog::{Album, AlbumId, Artist, ArtistId, Genre, Track, TrackId};
use crate::model::listener::{normalize_user_name, NewUser, Review, User, UserId};
use crate::model::playlist::{random_playlist_name, PlayList, PlaylistId};
use crate::repo::catalog_repo::{
    pick_random_track_ids, search_needle, CatalogRepository, EntityKey, RepoError, RepoResult,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;

const TRACK_SELECT_SQL: &str = "SELECT
    t.track_id AS track_id,
    t.title AS title,
    t.track_duration AS track_duration,
    t.track_url AS track_url,
    ar.artist_id AS artist_id,
    ar.full_name AS full_name,
    al.album_id AS album_id,
    al.title AS album_title,
    al.album_url AS album_url,
    al.album_type AS album_type,
    al.release_year AS release_year
FROM tracks t
LEFT JOIN artists ar ON ar.artist_id = t.artist_id
LEFT JOIN albums al ON al.album_id = t.album_id";

const ALBUM_SELECT_SQL: &str = "SELECT
    album_id,
    title,
    album_url,
    album_type,
    release_year
FROM albums";

/// Catalog repository over a migrated SQLite connection.
pub struct SqliteCatalogRepository {
    conn: Connection,
}

impl SqliteCatalogRepository {
    /// Wraps a connection returned by `db::open_db`/`db::open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl CatalogRepository for SqliteCatalogRepository {
    fn add_user(&mut self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;
        let user_name = normalize_user_name(&user.user_name);
        if self.get_user(&user_name)?.is_some() {
            return Err(RepoError::Conflict(format!(
                "user name `{user_name}` is already taken"
            )));
        }

        self.conn.execute(
            "INSERT INTO users (user_name, password) VALUES (?1, ?2);",
            params![user_name.as_str(), user.password_hash.as_str()],
        )?;
        let id = UserId::try_from(self.conn.last_insert_rowid())
            .map_err(|_| RepoError::InvalidData("users.id out of range".to_string()))?;

        debug!("event=user_add module=repo backend=sqlite status=ok user_id={id}");
        Ok(NewUser::new(&user_name, user.password_hash.clone()).into_user(id))
    }

    fn get_user(&self, user_name: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, user_name, password FROM users WHERE user_name = ?1;",
                [normalize_user_name(user_name)],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, user_name, password FROM users WHERE id = ?1;",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn add_track(&mut self, track: &Track) -> RepoResult<()> {
        track.validate()?;
        let track = track.normalized();

        let tx = self.conn.transaction()?;
        if let Some(artist) = &track.artist {
            upsert_artist(&tx, artist)?;
        }
        if let Some(album) = &track.album {
            upsert_album(&tx, album)?;
        }
        for genre in &track.genres {
            upsert_genre(&tx, genre)?;
        }

        tx.execute(
            "INSERT INTO tracks (
                track_id,
                title,
                track_duration,
                track_url,
                artist_id,
                album_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (track_id) DO UPDATE SET
                title = excluded.title,
                track_duration = excluded.track_duration,
                track_url = excluded.track_url,
                artist_id = excluded.artist_id,
                album_id = excluded.album_id;",
            params![
                track.id,
                track.title.as_str(),
                track.duration_secs,
                track.url.as_deref(),
                track.artist.as_ref().map(|artist| artist.id),
                track.album.as_ref().map(|album| album.id),
            ],
        )?;

        tx.execute("DELETE FROM track_genres WHERE track_id = ?1;", [track.id])?;
        for genre_id in track.genre_ids() {
            tx.execute(
                "INSERT INTO track_genres (track_id, genre_id) VALUES (?1, ?2);",
                params![track.id, genre_id],
            )?;
        }
        tx.commit()?;

        debug!(
            "event=track_merge module=repo backend=sqlite status=ok track_id={}",
            track.id
        );
        Ok(())
    }

    fn get_track(&self, id: TrackId) -> RepoResult<Option<Track>> {
        load_track(&self.conn, id)
    }

    fn get_tracks(&self) -> RepoResult<Vec<Track>> {
        query_tracks(
            &self.conn,
            &format!("{TRACK_SELECT_SQL} ORDER BY t.track_id ASC;"),
            params![],
        )
    }

    fn get_number_of_tracks(&self) -> RepoResult<usize> {
        count_rows(&self.conn, "tracks")
    }

    fn get_tracks_by_artist(&self, artist_id: ArtistId) -> RepoResult<Vec<Track>> {
        query_tracks(
            &self.conn,
            &format!("{TRACK_SELECT_SQL} WHERE t.artist_id = ?1 ORDER BY t.track_id ASC;"),
            [artist_id],
        )
    }

    fn get_tracks_by_ids(&self, ids: &[TrackId]) -> RepoResult<Vec<Track>> {
        let mut seen = BTreeSet::new();
        let mut tracks = Vec::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(track) = load_track(&self.conn, *id)? {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    fn get_track_ids_by_genre(&self, genre_name: &str) -> RepoResult<Vec<TrackId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT tg.track_id
             FROM track_genres tg
             INNER JOIN genres g ON g.genre_id = tg.genre_id
             WHERE g.genre_name = ?1 COLLATE NOCASE
             ORDER BY tg.track_id ASC;",
        )?;
        let mut rows = stmt.query([genre_name.trim()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    fn search_tracks(&self, query: &str) -> RepoResult<Vec<Track>> {
        let Some(needle) = search_needle(query) else {
            return Ok(Vec::new());
        };

        query_tracks(
            &self.conn,
            &format!(
                "{TRACK_SELECT_SQL}
                 WHERE instr(lower(t.title), ?1) > 0
                    OR instr(lower(ar.full_name), ?1) > 0
                    OR instr(lower(al.title), ?1) > 0
                    OR EXISTS (
                        SELECT 1
                        FROM track_genres tg
                        INNER JOIN genres g ON g.genre_id = tg.genre_id
                        WHERE tg.track_id = t.track_id
                          AND instr(lower(g.genre_name), ?1) > 0
                    )
                 ORDER BY t.track_id ASC;"
            ),
            [needle],
        )
    }

    fn add_artist(&mut self, artist: &Artist) -> RepoResult<()> {
        artist.validate()?;
        upsert_artist(&self.conn, &artist.normalized())
    }

    fn get_artist(&self, id: ArtistId) -> RepoResult<Option<Artist>> {
        let artist = self
            .conn
            .query_row(
                "SELECT artist_id, full_name FROM artists WHERE artist_id = ?1;",
                [id],
                parse_artist_row,
            )
            .optional()?;
        Ok(artist)
    }

    fn get_artists(&self) -> RepoResult<Vec<Artist>> {
        let mut stmt = self
            .conn
            .prepare("SELECT artist_id, full_name FROM artists ORDER BY artist_id ASC;")?;
        let artists = stmt
            .query_map([], parse_artist_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    fn add_album(&mut self, album: &Album) -> RepoResult<()> {
        album.validate()?;
        upsert_album(&self.conn, &album.normalized())
    }

    fn get_album(&self, id: AlbumId) -> RepoResult<Option<Album>> {
        let album = self
            .conn
            .query_row(
                &format!("{ALBUM_SELECT_SQL} WHERE album_id = ?1;"),
                [id],
                parse_album_row,
            )
            .optional()?;
        Ok(album)
    }

    fn get_albums(&self) -> RepoResult<Vec<Album>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALBUM_SELECT_SQL} ORDER BY album_id ASC;"))?;
        let albums = stmt
            .query_map([], parse_album_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }

    fn get_number_of_albums(&self) -> RepoResult<usize> {
        count_rows(&self.conn, "albums")
    }

    fn add_genre(&mut self, genre: &Genre) -> RepoResult<()> {
        genre.validate()?;
        upsert_genre(&self.conn, &genre.normalized())
    }

    fn get_genres(&self) -> RepoResult<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare("SELECT genre_id, genre_name FROM genres ORDER BY genre_id ASC;")?;
        let genres = stmt
            .query_map([], |row| Ok(Genre::new(row.get(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    fn get_number_of_genres(&self) -> RepoResult<usize> {
        count_rows(&self.conn, "genres")
    }

    fn add_review(&mut self, review: &Review) -> RepoResult<()> {
        review.validate()?;
        if !track_exists(&self.conn, review.track_id)? {
            return Err(RepoError::NotFound(EntityKey::Track(review.track_id)));
        }

        self.conn.execute(
            "INSERT INTO reviews (track_id, review_text, rating, timestamp)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                review.track_id,
                review.review_text.as_str(),
                review.rating,
                review.timestamp_ms,
            ],
        )?;
        debug!(
            "event=review_add module=repo backend=sqlite status=ok track_id={} rating={}",
            review.track_id, review.rating
        );
        Ok(())
    }

    fn get_reviews(&self, track_id: TrackId) -> RepoResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT track_id, review_text, rating, timestamp
             FROM reviews
             WHERE track_id = ?1
             ORDER BY id ASC;",
        )?;
        let reviews = stmt
            .query_map([track_id], |row| {
                Ok(Review {
                    track_id: row.get("track_id")?,
                    review_text: row.get("review_text")?,
                    rating: row.get("rating")?,
                    timestamp_ms: row.get("timestamp")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    fn add_playlist(&mut self, playlist: &PlayList) -> RepoResult<()> {
        playlist.validate()?;
        let tx = self.conn.transaction()?;
        insert_playlist(&tx, playlist)?;
        tx.commit()?;
        Ok(())
    }

    fn get_playlist(&self, id: PlaylistId) -> RepoResult<Option<PlayList>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM playlists WHERE playlist_id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        match name {
            Some(name) => Ok(Some(load_playlist(&self.conn, id, name)?)),
            None => Ok(None),
        }
    }

    fn get_playlists(&self) -> RepoResult<Vec<PlayList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT playlist_id, name FROM playlists ORDER BY playlist_id ASC;")?;
        let headers = stmt
            .query_map([], |row| Ok((row.get::<_, PlaylistId>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        headers
            .into_iter()
            .map(|(id, name)| load_playlist(&self.conn, id, name))
            .collect()
    }

    fn add_track_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()> {
        if !track_exists(&self.conn, track_id)? {
            return Err(RepoError::NotFound(EntityKey::Track(track_id)));
        }
        if !playlist_exists(&self.conn, playlist_id)? {
            return Err(RepoError::NotFound(EntityKey::Playlist(playlist_id)));
        }

        // PK (playlist_id, track_id) turns a repeated add into a no-op.
        self.conn.execute(
            "INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1
             FROM playlist_tracks
             WHERE playlist_id = ?1;",
            params![playlist_id, track_id],
        )?;
        Ok(())
    }

    fn remove_track_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> RepoResult<()> {
        if !playlist_exists(&self.conn, playlist_id)? {
            return Err(RepoError::NotFound(EntityKey::Playlist(playlist_id)));
        }
        self.conn.execute(
            "DELETE FROM playlist_tracks WHERE playlist_id = ?1 AND track_id = ?2;",
            params![playlist_id, track_id],
        )?;
        Ok(())
    }

    fn next_playlist_id(&self) -> RepoResult<PlaylistId> {
        next_playlist_id(&self.conn)
    }

    fn create_random_playlist(&mut self, length: usize) -> RepoResult<PlayList> {
        let tx = self.conn.transaction()?;

        let all_ids = {
            let mut stmt = tx.prepare("SELECT track_id FROM tracks ORDER BY track_id ASC;")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, TrackId>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        let picked = pick_random_track_ids(&all_ids, length)?;

        let id = next_playlist_id(&tx)?;
        let mut playlist = PlayList::new(id, random_playlist_name(id));
        for track_id in picked {
            if let Some(track) = load_track(&tx, track_id)? {
                playlist.add_track(track);
            }
        }

        insert_playlist(&tx, &playlist)?;
        tx.commit()?;
        Ok(playlist)
    }
}

fn upsert_artist(conn: &Connection, artist: &Artist) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO artists (artist_id, full_name) VALUES (?1, ?2)
         ON CONFLICT (artist_id) DO UPDATE SET full_name = excluded.full_name;",
        params![artist.id, artist.full_name.as_str()],
    )?;
    Ok(())
}

fn upsert_album(conn: &Connection, album: &Album) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO albums (album_id, title, album_url, album_type, release_year)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (album_id) DO UPDATE SET
            title = excluded.title,
            album_url = excluded.album_url,
            album_type = excluded.album_type,
            release_year = excluded.release_year;",
        params![
            album.id,
            album.title.as_str(),
            album.album_url.as_deref(),
            album.album_type.as_deref(),
            album.release_year,
        ],
    )?;
    Ok(())
}

fn upsert_genre(conn: &Connection, genre: &Genre) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO genres (genre_id, genre_name) VALUES (?1, ?2)
         ON CONFLICT (genre_id) DO UPDATE SET genre_name = excluded.genre_name;",
        params![genre.id, genre.name.as_str()],
    )?;
    Ok(())
}

/// Inserts playlist header and entries; the caller owns the transaction.
fn insert_playlist(conn: &Connection, playlist: &PlayList) -> RepoResult<()> {
    if playlist_exists(conn, playlist.id)? {
        return Err(RepoError::Conflict(format!(
            "playlist {} already exists",
            playlist.id
        )));
    }
    for track in &playlist.tracks {
        if !track_exists(conn, track.id)? {
            return Err(RepoError::NotFound(EntityKey::Track(track.id)));
        }
    }

    conn.execute(
        "INSERT INTO playlists (playlist_id, name) VALUES (?1, ?2);",
        params![playlist.id, playlist.stored_name()],
    )?;
    for (position, track) in playlist.tracks.iter().enumerate() {
        conn.execute(
            "INSERT INTO playlist_tracks (playlist_id, track_id, position)
             VALUES (?1, ?2, ?3);",
            params![playlist.id, track.id, position as i64],
        )?;
    }

    debug!(
        "event=playlist_add module=repo backend=sqlite status=ok playlist_id={} tracks={}",
        playlist.id,
        playlist.size()
    );
    Ok(())
}

fn load_playlist(conn: &Connection, id: PlaylistId, name: String) -> RepoResult<PlayList> {
    let mut stmt = conn.prepare(
        "SELECT track_id
         FROM playlist_tracks
         WHERE playlist_id = ?1
         ORDER BY position ASC;",
    )?;
    let track_ids = stmt
        .query_map([id], |row| row.get::<_, TrackId>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut playlist = PlayList::new(id, name);
    for track_id in track_ids {
        let track = load_track(conn, track_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "playlist {id} references missing track {track_id}"
            ))
        })?;
        playlist.tracks.push(track);
    }
    Ok(playlist)
}

fn load_track(conn: &Connection, id: TrackId) -> RepoResult<Option<Track>> {
    let mut tracks = query_tracks(
        conn,
        &format!("{TRACK_SELECT_SQL} WHERE t.track_id = ?1;"),
        [id],
    )?;
    Ok(tracks.pop())
}

fn query_tracks<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Track>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut tracks = Vec::new();
    while let Some(row) = rows.next()? {
        let mut track = parse_track_row(row)?;
        track.genres = load_track_genres(conn, track.id)?;
        tracks.push(track);
    }
    Ok(tracks)
}

fn parse_track_row(row: &Row<'_>) -> RepoResult<Track> {
    let artist = match row.get::<_, Option<ArtistId>>("artist_id")? {
        Some(id) => Some(Artist::new(id, row.get::<_, String>("full_name")?)),
        None => None,
    };
    let album = match row.get::<_, Option<AlbumId>>("album_id")? {
        Some(id) => Some(Album {
            id,
            title: row.get("album_title")?,
            album_url: row.get("album_url")?,
            album_type: row.get("album_type")?,
            release_year: row.get("release_year")?,
        }),
        None => None,
    };

    let track = Track {
        id: row.get("track_id")?,
        title: row.get("title")?,
        duration_secs: row.get("track_duration")?,
        url: row.get("track_url")?,
        artist,
        album,
        genres: Vec::new(),
    };
    if track.title.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty title in tracks.title for track {}",
            track.id
        )));
    }
    Ok(track)
}

fn load_track_genres(conn: &Connection, track_id: TrackId) -> RepoResult<Vec<Genre>> {
    let mut stmt = conn.prepare(
        "SELECT g.genre_id, g.genre_name
         FROM track_genres tg
         INNER JOIN genres g ON g.genre_id = tg.genre_id
         WHERE tg.track_id = ?1
         ORDER BY g.genre_id ASC;",
    )?;
    let genres = stmt
        .query_map([track_id], |row| {
            Ok(Genre::new(row.get(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(genres)
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        user_name: row.get("user_name")?,
        password_hash: row.get("password")?,
    })
}

fn parse_artist_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get("artist_id")?,
        full_name: row.get("full_name")?,
    })
}

fn parse_album_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get("album_id")?,
        title: row.get("title")?,
        album_url: row.get("album_url")?,
        album_type: row.get("album_type")?,
        release_year: row.get("release_year")?,
    })
}

fn next_playlist_id(conn: &Connection) -> RepoResult<PlaylistId> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(playlist_id) + 1, 0) FROM playlists;",
        [],
        |row| row.get(0),
    )?;
    PlaylistId::try_from(next)
        .map_err(|_| RepoError::InvalidData(format!("playlist id {next} out of range")))
}

fn track_exists(conn: &Connection, id: TrackId) -> RepoResult<bool> {
    exists(conn, "SELECT EXISTS(SELECT 1 FROM tracks WHERE track_id = ?1);", id)
}

fn playlist_exists(conn: &Connection, id: PlaylistId) -> RepoResult<bool> {
    exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM playlists WHERE playlist_id = ?1);",
        id,
    )
}

fn exists(conn: &Connection, sql: &str, id: u32) -> RepoResult<bool> {
    let found: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(found == 1)
}

fn count_rows(conn: &Connection, table: &'static str) -> RepoResult<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count for {table}")))
}
