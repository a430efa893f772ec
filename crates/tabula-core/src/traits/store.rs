//! Record store trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::RecordCollection;

/// Persists the full record collection of one entity type as a single
/// document.
///
/// Implementations must never expose a partially written document: a
/// `save` either replaces the whole content or fails.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the current collection.
    ///
    /// If the medium does not exist yet it is created holding an empty
    /// collection, which is returned. A medium that exists but cannot be
    /// read or parsed yields [`Error::StorageUnavailable`](crate::Error).
    async fn load(&self) -> Result<RecordCollection>;

    /// Overwrite the medium with the given collection.
    async fn save(&self, collection: &RecordCollection) -> Result<()>;
}
