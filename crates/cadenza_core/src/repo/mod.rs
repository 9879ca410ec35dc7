//! Repository layer: one catalog contract, two interchangeable backends.
//!
//! # Responsibility
//! - Define the `CatalogRepository` contract consumed by services.
//! - Provide an in-memory backend and a SQLite backend behind it.
//!
//! # Invariants
//! - Both backends return identical results for identical call sequences;
//!   `tests/repository_contract.rs` runs one suite against each.
//! - Services never depend on a concrete backend type.

pub mod catalog_repo;
pub mod memory_repo;
pub mod sqlite_repo;
