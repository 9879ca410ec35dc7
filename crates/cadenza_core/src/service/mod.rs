//! Use-case services over the catalog repository.
//!
//! # Responsibility
//! - Turn repository `Option`/`NotFound` results into use-case errors.
//! - Hold policy that is not storage's business (password rules, unique
//!   playlist names, review timestamps).
//!
//! Services borrow the repository mutably for their lifetime, so they work
//! the same over a concrete backend or a `Box<dyn CatalogRepository>`.

pub mod auth_service;
pub mod playlist_service;
pub mod track_service;
