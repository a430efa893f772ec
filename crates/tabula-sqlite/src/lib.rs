//! tabula-sqlite - SQLite-backed repository.
//!
//! Unlike the document stores, every repository call maps to a single
//! statement (or a short transaction), so mutations rely on SQLite's own
//! atomicity instead of rewriting the whole collection.

mod columns;
mod repository;

pub use repository::SqliteRepository;
