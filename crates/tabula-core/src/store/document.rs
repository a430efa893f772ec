//! Repository over a whole-document record store.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{Error, InvalidInputError};
use crate::record::{Record, RecordId};
use crate::traits::{RecordStore, Repository};
use crate::Result;

/// Implements [`Repository`] on top of a [`RecordStore`].
///
/// Every mutation is one load, modify, save cycle. Nothing serializes
/// concurrent cycles, so two racing writers both start from the same
/// document and the later save wins. The store guarantees that whichever
/// save lands, the document is complete.
#[derive(Debug, Clone)]
pub struct DocumentRepository<S> {
    store: S,
}

impl<S: RecordStore> DocumentRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: RecordStore> Repository for DocumentRepository<S> {
    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.store.load().await?.into_vec())
    }

    async fn get(&self, id: &RecordId) -> Result<Record> {
        self.store
            .load()
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.as_str()))
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn insert(&self, record: Record) -> Result<Record> {
        let mut collection = self.store.load().await?;

        collection.push(record.clone()).map_err(|r| InvalidInputError::RecordId {
            value: r.id().to_string(),
            reason: "already in use".to_string(),
        })?;

        self.store.save(&collection).await?;
        debug!(count = collection.len(), "Inserted record");

        Ok(record)
    }

    #[instrument(skip(self, record), fields(id = %record.id()))]
    async fn replace(&self, record: Record) -> Result<Record> {
        let mut collection = self.store.load().await?;

        collection
            .replace(record.clone())
            .map_err(|r| Error::not_found(r.id().as_str()))?;

        self.store.save(&collection).await?;
        debug!("Replaced record");

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn remove(&self, id: &RecordId) -> Result<Record> {
        let mut collection = self.store.load().await?;

        let removed = collection
            .remove(id)
            .ok_or_else(|| Error::not_found(id.as_str()))?;

        self.store.save(&collection).await?;
        debug!(count = collection.len(), "Removed record");

        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.load().await?.len())
    }
}
