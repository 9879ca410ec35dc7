//! Behaviour every `CatalogRepository` backend must share.
//!
//! Each scenario is written once against `&mut dyn CatalogRepository` and
//! instantiated per backend by `repository_contract!`.

use cadenza_core::{
    populate, Album, Artist, CatalogRepository, CatalogSeed, EntityKey, Genre,
    MemoryCatalogRepository, NewUser, PlayList, RepoError, Review, SqliteCatalogRepository, Track,
};
use std::collections::BTreeSet;

fn sample_track() -> Track {
    let mut track = Track::new(2, "Food");
    track.duration_secs = Some(168);
    track.url = Some("http://freemusicarchive.org/music/AWOL/Food".to_string());
    track.artist = Some(Artist::new(1, "AWOL"));
    let mut album = Album::new(1, "AWOL - A Way Of Life");
    album.album_type = Some("Album".to_string());
    album.release_year = Some(2009);
    track.album = Some(album);
    track.add_genre(Genre::new(21, "Hip-Hop"));
    track.add_genre(Genre::new(12, "Rock"));
    track
}

fn seed_small_catalog(repo: &mut dyn CatalogRepository) {
    repo.add_track(&sample_track()).unwrap();

    let mut electric = Track::new(3, "Electric Ave");
    electric.artist = Some(Artist::new(1, "AWOL"));
    electric.add_genre(Genre::new(21, "Hip-Hop"));
    repo.add_track(&electric).unwrap();

    let mut spiral = Track::new(5, "This World");
    spiral.artist = Some(Artist::new(6, "Kurt Vile"));
    spiral.add_genre(Genre::new(12, "Rock"));
    repo.add_track(&spiral).unwrap();
}

const PADDED_SEED_JSON: &str = r#"{
    "artists": [ { "id": 1, "full_name": "  AWOL  " } ],
    "albums": [ { "id": 1, "title": " A Way Of Life ", "release_year": 2009 } ],
    "genres": [ { "id": 21, "name": " Hip-Hop " } ],
    "tracks": [
        {
            "id": 2,
            "title": " Food ",
            "artist": { "id": 1, "full_name": "  AWOL  " },
            "album": { "id": 1, "title": " A Way Of Life " },
            "genres": [ { "id": 21, "name": " Hip-Hop " } ]
        }
    ],
    "featured_track_ids": [2]
}"#;

fn track_ids(tracks: &[Track]) -> Vec<u32> {
    tracks.iter().map(|track| track.id).collect()
}

fn add_track_merges_referenced_entities(repo: &mut dyn CatalogRepository) {
    let track = sample_track();
    repo.add_track(&track).unwrap();

    assert_eq!(repo.get_track(2).unwrap(), Some(track.clone()));
    assert_eq!(repo.get_artist(1).unwrap(), track.artist);
    assert_eq!(repo.get_album(1).unwrap(), track.album);
    assert_eq!(repo.get_number_of_tracks().unwrap(), 1);
    assert_eq!(repo.get_number_of_albums().unwrap(), 1);
    assert_eq!(repo.get_number_of_genres().unwrap(), 2);
    assert_eq!(repo.get_track(99).unwrap(), None);
}

fn re_adding_track_replaces_fields_and_genres(repo: &mut dyn CatalogRepository) {
    repo.add_track(&sample_track()).unwrap();

    let mut renamed = Track::new(2, "Food (Remastered)");
    renamed.artist = Some(Artist::new(1, "AWOL"));
    renamed.add_genre(Genre::new(12, "Rock"));
    repo.add_track(&renamed).unwrap();

    let loaded = repo.get_track(2).unwrap().unwrap();
    assert_eq!(loaded.title, "Food (Remastered)");
    assert_eq!(loaded.album, None);
    assert_eq!(loaded.genre_ids(), vec![12]);
    assert_eq!(repo.get_number_of_tracks().unwrap(), 1);
    // Orphaned genre rows stay in the catalog.
    assert_eq!(repo.get_number_of_genres().unwrap(), 2);
}

fn invalid_entities_are_rejected(repo: &mut dyn CatalogRepository) {
    assert!(matches!(
        repo.add_track(&Track::new(1, "   ")),
        Err(RepoError::Validation(_))
    ));
    assert!(matches!(
        repo.add_artist(&Artist::new(1, "")),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(repo.get_number_of_tracks().unwrap(), 0);
}

fn listings_are_ordered_by_id(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);
    repo.add_genre(&Genre::new(2, "Blues")).unwrap();

    assert_eq!(track_ids(&repo.get_tracks().unwrap()), vec![2, 3, 5]);
    let artist_ids: Vec<_> = repo.get_artists().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(artist_ids, vec![1, 6]);
    let genre_ids: Vec<_> = repo.get_genres().unwrap().iter().map(|g| g.id).collect();
    assert_eq!(genre_ids, vec![2, 12, 21]);
}

fn tracks_by_artist_and_by_ids(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);

    assert_eq!(track_ids(&repo.get_tracks_by_artist(1).unwrap()), vec![2, 3]);
    assert!(repo.get_tracks_by_artist(42).unwrap().is_empty());

    let picked = repo.get_tracks_by_ids(&[5, 99, 2, 5]).unwrap();
    assert_eq!(track_ids(&picked), vec![5, 2]);
    assert!(repo.get_tracks_by_ids(&[]).unwrap().is_empty());
}

fn genre_lookup_ignores_case(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);

    assert_eq!(repo.get_track_ids_by_genre("hip-hop").unwrap(), vec![2, 3]);
    assert_eq!(repo.get_track_ids_by_genre(" ROCK ").unwrap(), vec![2, 5]);
    assert!(repo.get_track_ids_by_genre("Jazz").unwrap().is_empty());
}

fn search_matches_title_artist_album_and_genre(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);

    assert_eq!(track_ids(&repo.search_tracks("electric").unwrap()), vec![3]);
    assert_eq!(track_ids(&repo.search_tracks("kurt").unwrap()), vec![5]);
    assert_eq!(track_ids(&repo.search_tracks("WAY OF").unwrap()), vec![2]);
    assert_eq!(track_ids(&repo.search_tracks("rock").unwrap()), vec![2, 5]);
    assert!(repo.search_tracks("   ").unwrap().is_empty());
    assert!(repo.search_tracks("polka").unwrap().is_empty());
}

fn users_get_sequential_ids_and_unique_names(repo: &mut dyn CatalogRepository) {
    let first = repo.add_user(&NewUser::new("Alice", "hash-a")).unwrap();
    let second = repo.add_user(&NewUser::new("bob", "hash-b")).unwrap();
    assert_eq!((first.id, second.id), (1, 2));
    assert_eq!(first.user_name, "alice");

    assert!(matches!(
        repo.add_user(&NewUser::new(" ALICE ", "other")),
        Err(RepoError::Conflict(_))
    ));
    assert_eq!(repo.get_user("ALICE").unwrap(), Some(first.clone()));
    assert_eq!(repo.get_user_by_id(2).unwrap(), Some(second));
    assert_eq!(repo.get_user("carol").unwrap(), None);
}

fn reviews_require_existing_track_and_valid_rating(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);

    assert!(matches!(
        repo.add_review(&Review::new(99, "lost", 3, 1)),
        Err(RepoError::NotFound(EntityKey::Track(99)))
    ));
    assert!(matches!(
        repo.add_review(&Review::new(2, "too good", 6, 1)),
        Err(RepoError::Validation(_))
    ));

    repo.add_review(&Review::new(2, "first", 4, 10)).unwrap();
    repo.add_review(&Review::new(2, "second", 5, 20)).unwrap();
    repo.add_review(&Review::new(3, "other", 1, 30)).unwrap();

    let texts: Vec<_> = repo
        .get_reviews(2)
        .unwrap()
        .into_iter()
        .map(|review| review.review_text)
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(repo.get_reviews(5).unwrap().is_empty());
}

fn playlist_lifecycle(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);
    assert_eq!(repo.next_playlist_id().unwrap(), 0);

    let mut mixtape = PlayList::new(0, "Mixtape");
    mixtape.add_track(repo.get_track(5).unwrap().unwrap());
    repo.add_playlist(&mixtape).unwrap();
    assert_eq!(repo.next_playlist_id().unwrap(), 1);

    assert!(matches!(
        repo.add_playlist(&PlayList::new(0, "Again")),
        Err(RepoError::Conflict(_))
    ));

    repo.add_track_to_playlist(0, 2).unwrap();
    repo.add_track_to_playlist(0, 5).unwrap();
    let loaded = repo.get_playlist(0).unwrap().unwrap();
    assert_eq!(track_ids(&loaded.tracks), vec![5, 2]);

    repo.remove_track_from_playlist(0, 5).unwrap();
    repo.remove_track_from_playlist(0, 99).unwrap();
    let loaded = repo.get_playlist(0).unwrap().unwrap();
    assert_eq!(track_ids(&loaded.tracks), vec![2]);
    assert_eq!(loaded.name, "Mixtape");

    assert!(matches!(
        repo.add_track_to_playlist(0, 99),
        Err(RepoError::NotFound(EntityKey::Track(99)))
    ));
    assert!(matches!(
        repo.add_track_to_playlist(7, 2),
        Err(RepoError::NotFound(EntityKey::Playlist(7)))
    ));
    assert!(matches!(
        repo.remove_track_from_playlist(7, 2),
        Err(RepoError::NotFound(EntityKey::Playlist(7)))
    ));
    assert_eq!(repo.get_playlist(7).unwrap(), None);
}

fn playlist_with_unknown_track_is_rejected(repo: &mut dyn CatalogRepository) {
    let mut playlist = PlayList::new(3, "Ghosts");
    playlist.add_track(Track::new(404, "Missing"));
    assert!(matches!(
        repo.add_playlist(&playlist),
        Err(RepoError::NotFound(EntityKey::Track(404)))
    ));
    assert!(repo.get_playlists().unwrap().is_empty());
}

fn random_playlist_is_distinct_capped_and_stored(repo: &mut dyn CatalogRepository) {
    seed_small_catalog(repo);
    repo.add_playlist(&PlayList::new(4, "Existing")).unwrap();

    let random = repo.create_random_playlist(10).unwrap();
    assert_eq!(random.id, 5);
    assert_eq!(random.name, "Random Playlist #5");
    assert_eq!(random.size(), 3);
    let unique: BTreeSet<_> = random.track_ids().into_iter().collect();
    assert_eq!(unique.len(), 3);

    assert_eq!(repo.get_playlist(5).unwrap(), Some(random));
    assert_eq!(repo.create_random_playlist(2).unwrap().size(), 2);

    assert!(matches!(
        repo.create_random_playlist(0),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(repo.get_playlists().unwrap().len(), 3);
}

fn padded_names_are_stored_trimmed(repo: &mut dyn CatalogRepository) {
    let seed = CatalogSeed::from_json_str(PADDED_SEED_JSON).unwrap();
    populate(repo, &seed).unwrap();

    let track = repo.get_track(2).unwrap().unwrap();
    assert_eq!(track.title, "Food");
    assert_eq!(track.artist.unwrap().full_name, "AWOL");
    assert_eq!(track.album.unwrap().title, "A Way Of Life");
    assert_eq!(track.genres[0].name, "Hip-Hop");
    assert_eq!(repo.get_artist(1).unwrap().unwrap().full_name, "AWOL");
    assert_eq!(repo.get_album(1).unwrap().unwrap().title, "A Way Of Life");
    assert_eq!(repo.get_genres().unwrap()[0].name, "Hip-Hop");

    repo.add_artist(&Artist {
        id: 6,
        full_name: " Kurt Vile ".to_string(),
    })
    .unwrap();
    assert_eq!(repo.get_artist(6).unwrap().unwrap().full_name, "Kurt Vile");

    repo.add_playlist(&PlayList {
        id: 3,
        name: " Spaced out ".to_string(),
        tracks: Vec::new(),
    })
    .unwrap();
    assert_eq!(repo.get_playlist(3).unwrap().unwrap().name, "Spaced out");
}

fn exhausted_playlist_ids_are_invalid_data(repo: &mut dyn CatalogRepository) {
    repo.add_track(&Track::new(1, "One")).unwrap();
    repo.add_playlist(&PlayList::new(u32::MAX, "Last")).unwrap();

    let err = repo.next_playlist_id().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(err.to_string().contains("4294967296"));
    assert!(matches!(
        repo.create_random_playlist(1),
        Err(RepoError::InvalidData(_))
    ));
    assert_eq!(repo.get_playlists().unwrap().len(), 1);
}

#[test]
fn backends_read_back_identical_catalogs_from_a_padded_seed() {
    let seed = CatalogSeed::from_json_str(PADDED_SEED_JSON).unwrap();
    let mut memory = MemoryCatalogRepository::new();
    let mut sqlite = SqliteCatalogRepository::open_in_memory().unwrap();
    let repos: [&mut dyn CatalogRepository; 2] = [&mut memory, &mut sqlite];
    for repo in repos {
        populate(repo, &seed).unwrap();
    }

    assert_eq!(memory.get_tracks().unwrap(), sqlite.get_tracks().unwrap());
    assert_eq!(memory.get_artists().unwrap(), sqlite.get_artists().unwrap());
    assert_eq!(memory.get_albums().unwrap(), sqlite.get_albums().unwrap());
    assert_eq!(memory.get_genres().unwrap(), sqlite.get_genres().unwrap());
    assert_eq!(memory.get_playlists().unwrap(), sqlite.get_playlists().unwrap());
}

macro_rules! repository_contract {
    ($backend:ident, $make:expr) => {
        mod $backend {
            use super::*;

            #[test]
            fn add_track_merges_referenced_entities() {
                super::add_track_merges_referenced_entities(&mut $make);
            }

            #[test]
            fn re_adding_track_replaces_fields_and_genres() {
                super::re_adding_track_replaces_fields_and_genres(&mut $make);
            }

            #[test]
            fn invalid_entities_are_rejected() {
                super::invalid_entities_are_rejected(&mut $make);
            }

            #[test]
            fn listings_are_ordered_by_id() {
                super::listings_are_ordered_by_id(&mut $make);
            }

            #[test]
            fn tracks_by_artist_and_by_ids() {
                super::tracks_by_artist_and_by_ids(&mut $make);
            }

            #[test]
            fn genre_lookup_ignores_case() {
                super::genre_lookup_ignores_case(&mut $make);
            }

            #[test]
            fn search_matches_title_artist_album_and_genre() {
                super::search_matches_title_artist_album_and_genre(&mut $make);
            }

            #[test]
            fn users_get_sequential_ids_and_unique_names() {
                super::users_get_sequential_ids_and_unique_names(&mut $make);
            }

            #[test]
            fn reviews_require_existing_track_and_valid_rating() {
                super::reviews_require_existing_track_and_valid_rating(&mut $make);
            }

            #[test]
            fn playlist_lifecycle() {
                super::playlist_lifecycle(&mut $make);
            }

            #[test]
            fn playlist_with_unknown_track_is_rejected() {
                super::playlist_with_unknown_track_is_rejected(&mut $make);
            }

            #[test]
            fn random_playlist_is_distinct_capped_and_stored() {
                super::random_playlist_is_distinct_capped_and_stored(&mut $make);
            }

            #[test]
            fn padded_names_are_stored_trimmed() {
                super::padded_names_are_stored_trimmed(&mut $make);
            }

            #[test]
            fn exhausted_playlist_ids_are_invalid_data() {
                super::exhausted_playlist_ids_are_invalid_data(&mut $make);
            }
        }
    };
}

repository_contract!(memory, MemoryCatalogRepository::new());
repository_contract!(sqlite, SqliteCatalogRepository::open_in_memory().unwrap());
