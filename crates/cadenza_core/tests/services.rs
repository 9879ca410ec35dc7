use cadenza_core::{
    open_repository, Album, Artist, AuthService, AuthServiceError, CatalogRepository, Genre,
    PlaylistService, PlaylistServiceError, RepositoryBackend, SqliteCatalogRepository, Track,
    TrackService, TrackServiceError,
};

fn catalog() -> SqliteCatalogRepository {
    let mut repo = SqliteCatalogRepository::open_in_memory().unwrap();
    let mut food = Track::new(2, "Food");
    food.artist = Some(Artist::new(1, "AWOL"));
    food.album = Some(Album::new(1, "AWOL - A Way Of Life"));
    food.add_genre(Genre::new(21, "Hip-Hop"));
    repo.add_track(&food).unwrap();

    let mut world = Track::new(5, "This World");
    world.artist = Some(Artist::new(6, "Kurt Vile"));
    world.album = Some(Album::new(4, "Constant Hitmaker"));
    world.add_genre(Genre::new(12, "Rock"));
    repo.add_track(&world).unwrap();
    repo
}

#[test]
fn register_then_authenticate() {
    let mut repo = catalog();
    let mut auth = AuthService::with_rounds(&mut repo, 1_000);

    let user = auth.add_user(" Listener_1 ", "Secret123").unwrap();
    assert_eq!(user.user_name, "listener_1");
    assert_ne!(user.password_hash, "Secret123");

    assert_eq!(auth.authenticate_user("LISTENER_1", "Secret123").unwrap().id, user.id);
    assert!(matches!(
        auth.authenticate_user("listener_1", "Secret124"),
        Err(AuthServiceError::Authentication)
    ));
    assert!(matches!(
        auth.authenticate_user("nobody", "Secret123"),
        Err(AuthServiceError::UnknownUser(_))
    ));
}

#[test]
fn login_uses_the_cost_stored_with_each_hash() {
    let mut repo = catalog();
    AuthService::with_rounds(&mut repo, 1_000)
        .add_user("early_bird", "Secret123")
        .unwrap();

    let stored = repo.get_user("early_bird").unwrap().unwrap().password_hash;
    assert!(stored.starts_with("pbkdf2:sha256:1000$"));

    let auth = AuthService::with_rounds(&mut repo, 2_000);
    assert_eq!(
        auth.authenticate_user("early_bird", "Secret123").unwrap().user_name,
        "early_bird"
    );
}

#[test]
fn registration_enforces_name_and_password_rules() {
    let mut repo = catalog();
    let mut auth = AuthService::with_rounds(&mut repo, 1_000);
    auth.add_user("listener", "Secret123").unwrap();

    assert!(matches!(
        auth.add_user("LISTENER", "Secret123"),
        Err(AuthServiceError::NameNotUnique(_))
    ));
    assert!(matches!(
        auth.add_user("x", "Secret123"),
        Err(AuthServiceError::InvalidUserName(_))
    ));
    assert!(matches!(
        auth.add_user("with space", "Secret123"),
        Err(AuthServiceError::InvalidUserName(_))
    ));
    assert!(matches!(
        auth.add_user("another", "secret123"),
        Err(AuthServiceError::WeakPassword(_))
    ));
}

#[test]
fn track_service_sorts_browse_lists_by_name() {
    let mut repo = catalog();
    let service = TrackService::new(&mut repo);

    let artists: Vec<_> = service
        .get_artists()
        .unwrap()
        .into_iter()
        .map(|artist| artist.full_name)
        .collect();
    assert_eq!(artists, vec!["AWOL", "Kurt Vile"]);

    let albums: Vec<_> = service
        .get_albums()
        .unwrap()
        .into_iter()
        .map(|album| album.title)
        .collect();
    assert_eq!(albums, vec!["AWOL - A Way Of Life", "Constant Hitmaker"]);

    let genres: Vec<_> = service
        .get_genres()
        .unwrap()
        .into_iter()
        .map(|genre| genre.name)
        .collect();
    assert_eq!(genres, vec!["Hip-Hop", "Rock"]);
    assert_eq!(service.get_number_of_albums().unwrap(), 2);
    assert_eq!(service.get_number_of_genres().unwrap(), 2);
}

#[test]
fn track_service_reports_missing_entities() {
    let mut repo = catalog();
    let mut service = TrackService::new(&mut repo);

    assert!(matches!(
        service.get_track(404),
        Err(TrackServiceError::NonExistentTrack(404))
    ));
    assert!(matches!(
        service.get_tracks_by_artist(404),
        Err(TrackServiceError::NonExistentArtist(404))
    ));
    assert!(matches!(
        service.get_reviews(404),
        Err(TrackServiceError::NonExistentTrack(404))
    ));
    assert!(matches!(
        service.add_review(2, "nice", 0),
        Err(TrackServiceError::Repo(_))
    ));
    assert_eq!(service.search_tracks("hitmaker").unwrap().len(), 1);
    assert_eq!(service.get_track_ids_by_genre("rock").unwrap(), vec![5]);
}

#[test]
fn playlist_service_over_boxed_repository() {
    let mut repo = open_repository(&RepositoryBackend::Sqlite { path: None }).unwrap();
    repo.add_track(&Track::new(1, "One")).unwrap();
    repo.add_track(&Track::new(2, "Two")).unwrap();

    let mut playlists = PlaylistService::new(&mut *repo);
    let mixtape = playlists.add_playlist("  Mixtape ").unwrap();
    assert_eq!(mixtape.name, "Mixtape");

    let updated = playlists.add_track_to_playlist(mixtape.id, 2).unwrap();
    assert_eq!(updated.track_ids(), vec![2]);
    let updated = playlists.add_track_to_playlist(mixtape.id, 1).unwrap();
    assert_eq!(updated.track_ids(), vec![2, 1]);
    let updated = playlists.remove_track_from_playlist(mixtape.id, 2).unwrap();
    assert_eq!(updated.track_ids(), vec![1]);

    let random = playlists.create_random_playlist(5).unwrap();
    assert_eq!(random.id, mixtape.id + 1);
    assert_eq!(random.size(), 2);
    assert_eq!(playlists.get_playlists().unwrap().len(), 2);

    assert!(matches!(
        playlists.add_playlist("MIXTAPE"),
        Err(PlaylistServiceError::TitleNotUnique(_))
    ));
    assert!(matches!(
        playlists.remove_track_from_playlist(77, 1),
        Err(PlaylistServiceError::PlaylistNotFound(77))
    ));
}
