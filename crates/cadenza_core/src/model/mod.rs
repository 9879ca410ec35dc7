//! Domain model for the music catalog.
//!
//! # Responsibility
//! - Define the entities shared by every repository backend.
//! - Own per-entity validation so both backends reject the same input.
//!
//! # Invariants
//! - Entities reference each other by stable numeric ids.
//! - A `Track` carries hydrated copies of its artist, album and genres;
//!   backends resolve them from current records on every read.

pub mod catalog;
pub mod listener;
pub mod playlist;
pub mod validation;
