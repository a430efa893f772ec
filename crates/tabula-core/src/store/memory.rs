//! In-memory record store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Result;
use crate::record::RecordCollection;
use crate::traits::RecordStore;

/// A record store held in process memory.
///
/// Clones share the same underlying collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collection: Arc<Mutex<RecordCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection.
    pub fn with_collection(collection: RecordCollection) -> Self {
        Self {
            collection: Arc::new(Mutex::new(collection)),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> Result<RecordCollection> {
        Ok(self.collection.lock().await.clone())
    }

    async fn save(&self, collection: &RecordCollection) -> Result<()> {
        *self.collection.lock().await = collection.clone();
        Ok(())
    }
}
