//! Environment-driven application configuration.
//!
//! # Responsibility
//! - Resolve which repository backend to open and where logs go.
//! - Open the configured backend behind `Box<dyn CatalogRepository>`.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid values are errors.
//! - `from_lookup` never reads the process environment.

use crate::logging::default_log_level;
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use crate::repo::memory_repo::MemoryCatalogRepository;
use crate::repo::sqlite_repo::SqliteCatalogRepository;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const REPOSITORY_ENV: &str = "CADENZA_REPOSITORY";
pub const DATABASE_PATH_ENV: &str = "CADENZA_DATABASE_PATH";
pub const LOG_LEVEL_ENV: &str = "CADENZA_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CADENZA_LOG_DIR";

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryBackend {
    Memory,
    /// `path: None` opens an in-memory SQLite database.
    Sqlite { path: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub repository: RepositoryBackend,
    pub log_level: String,
    /// File logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryBackend::Memory,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownRepository(String),
    /// Variable is set but its value is empty after trimming.
    EmptyValue(&'static str),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRepository(value) => write!(
                f,
                "{REPOSITORY_ENV}=`{value}` is not supported; expected memory|database"
            ),
            Self::EmptyValue(name) => write!(f, "{name} is set but empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "{LOG_DIR_ENV} must be absolute, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value when set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                None => Ok(None),
                Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(name)),
                Some(value) => Ok(Some(value.trim().to_string())),
            }
        };

        let repository = match read(REPOSITORY_ENV)?.as_deref() {
            None => RepositoryBackend::Memory,
            Some(kind) if kind.eq_ignore_ascii_case("memory") => RepositoryBackend::Memory,
            Some(kind) if kind.eq_ignore_ascii_case("database") => RepositoryBackend::Sqlite {
                path: read(DATABASE_PATH_ENV)?.map(PathBuf::from),
            },
            Some(other) => return Err(ConfigError::UnknownRepository(other.to_string())),
        };

        let log_dir = match read(LOG_DIR_ENV)? {
            Some(dir) if !Path::new(&dir).is_absolute() => {
                return Err(ConfigError::RelativeLogDir(PathBuf::from(dir)))
            }
            dir => dir.map(PathBuf::from),
        };

        Ok(Self {
            repository,
            log_level: read(LOG_LEVEL_ENV)?.unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
        })
    }
}

/// Opens the backend named by `backend`.
///
/// SQLite backends are migrated to the latest schema before they are returned.
pub fn open_repository(
    backend: &RepositoryBackend,
) -> Result<Box<dyn CatalogRepository>, RepoError> {
    let repo: Box<dyn CatalogRepository> = match backend {
        RepositoryBackend::Memory => Box::new(MemoryCatalogRepository::new()),
        RepositoryBackend::Sqlite { path: Some(path) } => {
            Box::new(SqliteCatalogRepository::open(path)?)
        }
        RepositoryBackend::Sqlite { path: None } => {
            Box::new(SqliteCatalogRepository::open_in_memory()?)
        }
    };
    info!(
        "event=repository_open module=config status=ok backend={}",
        match backend {
            RepositoryBackend::Memory => "memory",
            RepositoryBackend::Sqlite { .. } => "database",
        }
    );
    Ok(repo)
}
