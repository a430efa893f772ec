//! Repository trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::{Record, RecordId};

/// Keyed single-record persistence for one entity type.
///
/// This is the seam the [`EntityService`](crate::EntityService) talks to.
/// Document stores implement it through
/// [`DocumentRepository`](crate::DocumentRepository); databases implement
/// it directly with one statement per call.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All records, in insertion order.
    async fn list(&self) -> Result<Vec<Record>>;

    /// The record with the given id, or [`Error::NotFound`](crate::Error).
    async fn get(&self, id: &RecordId) -> Result<Record>;

    /// Store a new record. Its id must not be in use.
    async fn insert(&self, record: Record) -> Result<Record>;

    /// Overwrite the record with the same id, or fail with `NotFound`.
    async fn replace(&self, record: Record) -> Result<Record>;

    /// Remove and return the record with the given id, or fail with `NotFound`.
    async fn remove(&self, id: &RecordId) -> Result<Record>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}
