//! Core domain logic for the Cadenza music library.
//! Storage backends, use-case services and seeding all live here; the CLI
//! and any web layer only wire them together.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod populate;
pub mod repo;
pub mod service;

pub use config::{open_repository, AppConfig, ConfigError, RepositoryBackend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catalog::{Album, AlbumId, Artist, ArtistId, Genre, GenreId, Track, TrackId};
pub use model::listener::{NewUser, Review, User, UserId};
pub use model::playlist::{PlayList, PlaylistId};
pub use model::validation::ModelValidationError;
pub use populate::{populate, populate_if_empty, CatalogSeed, PopulateError, PopulateReport};
pub use repo::catalog_repo::{CatalogRepository, EntityKey, RepoError, RepoResult};
pub use repo::memory_repo::MemoryCatalogRepository;
pub use repo::sqlite_repo::SqliteCatalogRepository;
pub use service::auth_service::{AuthService, AuthServiceError};
pub use service::playlist_service::{PlaylistService, PlaylistServiceError};
pub use service::track_service::{TrackService, TrackServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
