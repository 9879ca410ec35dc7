//! Command-line entry point for `cadenza_core`.
//!
//! Usage: `cadenza_cli [SEED_JSON]`
//!
//! Opens the backend chosen by `CADENZA_*` environment variables, seeds it
//! from `SEED_JSON` when the repository is still empty, then prints counts.

use cadenza_core::{
    init_logging, open_repository, populate_if_empty, AppConfig, CatalogSeed, RepositoryBackend,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cadenza_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }
    info!("event=cli_start module=cli status=ok version={}", cadenza_core::core_version());

    let mut repo = open_repository(&config.repository)?;

    if let Some(seed_path) = std::env::args().nth(1) {
        let seed = CatalogSeed::from_json_file(&seed_path)?;
        match populate_if_empty(&mut *repo, &seed)? {
            Some(report) => println!(
                "seeded artists={} tracks={} albums={} genres={} featured={}",
                report.artists, report.tracks, report.albums, report.genres, report.featured_tracks
            ),
            None => println!("repository already populated; seed skipped"),
        }
    }

    let backend = match &config.repository {
        RepositoryBackend::Memory => "memory".to_string(),
        RepositoryBackend::Sqlite { path: Some(path) } => format!("database:{}", path.display()),
        RepositoryBackend::Sqlite { path: None } => "database:in-memory".to_string(),
    };
    println!("cadenza_core version={}", cadenza_core::core_version());
    println!("backend={backend}");
    println!("tracks={}", repo.get_number_of_tracks()?);
    println!("artists={}", repo.get_artists()?.len());
    println!("albums={}", repo.get_number_of_albums()?);
    println!("genres={}", repo.get_number_of_genres()?);
    println!("playlists={}", repo.get_playlists()?.len());
    Ok(())
}
