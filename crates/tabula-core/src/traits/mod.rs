//! Core traits for storage behavior.

mod repository;
mod store;

pub use repository::Repository;
pub use store::RecordStore;
