//! Entity service: CRUD semantics over a [`Repository`].
//!
//! The service owns everything that is not storage: id assignment,
//! timestamps, sanitizing and partial-update merging. Payload validation is
//! a separate step ([`EntityService::validate`]) run by the request layer
//! before a write.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{Error, InvalidInputError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::record::{Record, RecordId};
use crate::schema::{Mode, Schema};
use crate::traits::Repository;
use crate::validate::Validator;
use crate::Result;

/// Current time as an RFC 3339 UTC string with millisecond precision,
/// e.g. `2025-01-31T12:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// CRUD operations for one entity type.
///
/// Cheap to clone; clones share the repository and id generator.
#[derive(Clone)]
pub struct EntityService {
    schema: Arc<Schema>,
    repo: Arc<dyn Repository>,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for EntityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityService")
            .field("resource", &self.schema.resource())
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl EntityService {
    /// Create a service issuing UUID ids.
    pub fn new(schema: Schema, repo: impl Repository + 'static) -> Self {
        Self {
            schema: Arc::new(schema),
            repo: Arc::new(repo),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the id generator.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// All records, in insertion order.
    #[instrument(skip(self), fields(resource = %self.schema.resource()))]
    pub async fn list(&self) -> Result<Vec<Record>> {
        self.repo.list().await
    }

    /// A single record, or [`Error::NotFound`].
    #[instrument(skip(self), fields(resource = %self.schema.resource()))]
    pub async fn get(&self, id: &RecordId) -> Result<Record> {
        self.repo.get(id).await
    }

    /// Check a create or update payload against the schema.
    ///
    /// Callers run this before [`create`](Self::create) or
    /// [`update`](Self::update); the service itself only sanitizes.
    pub fn validate(&self, input: &Value, mode: Mode) -> Result<()> {
        let violations = Validator::new(&self.schema).validate(input, mode);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(violations))
        }
    }

    /// Store a new record.
    ///
    /// The record gets a fresh id and its creation (and update) timestamps.
    /// Fields outside the schema are dropped.
    #[instrument(skip(self, input), fields(resource = %self.schema.resource()))]
    pub async fn create(&self, input: &Value) -> Result<Record> {
        let mut fields = self.schema.sanitize(object(input)?, Mode::Create);

        let now = timestamp();
        for name in self.schema.timestamp_fields() {
            fields.insert(name.to_string(), Value::String(now.clone()));
        }

        let record = Record::new(self.ids.next_id(), fields);
        let record = self.repo.insert(record).await?;

        debug!(id = %record.id(), "Created record");
        Ok(record)
    }

    /// Merge supplied fields over an existing record.
    ///
    /// Omitted fields are retained, an explicit `null` clears a field, and
    /// the id never changes. An unknown id is [`Error::NotFound`] whatever
    /// the payload.
    #[instrument(skip(self, input), fields(resource = %self.schema.resource()))]
    pub async fn update(&self, id: &RecordId, input: &Value) -> Result<Record> {
        let mut record = self.repo.get(id).await?;

        let changes = self.schema.sanitize(object(input)?, Mode::Update);
        for (key, value) in changes {
            if value.is_null() {
                record.remove(&key);
            } else {
                record.set(key, value);
            }
        }

        if let Some(updated) = self.schema.updated_field() {
            record.set(updated, Value::String(timestamp()));
        }

        let record = self.repo.replace(record).await?;

        debug!(id = %record.id(), "Updated record");
        Ok(record)
    }

    /// Remove a record, returning it.
    #[instrument(skip(self), fields(resource = %self.schema.resource()))]
    pub async fn delete(&self, id: &RecordId) -> Result<Record> {
        let record = self.repo.remove(id).await?;

        debug!(id = %record.id(), "Deleted record");
        Ok(record)
    }

    /// Create the given records if the collection is empty.
    ///
    /// Returns how many records were created.
    #[instrument(skip(self, seeds), fields(resource = %self.schema.resource()))]
    pub async fn seed(&self, seeds: &[Value]) -> Result<usize> {
        if seeds.is_empty() || self.repo.count().await? > 0 {
            return Ok(0);
        }

        for seed in seeds {
            self.validate(seed, Mode::Create)?;
            self.create(seed).await?;
        }

        debug!(count = seeds.len(), "Seeded collection");
        Ok(seeds.len())
    }
}

fn object(input: &Value) -> Result<&Map<String, Value>> {
    input.as_object().ok_or_else(|| {
        InvalidInputError::Record {
            reason: "record must be a JSON object".to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequenceGenerator;
    use crate::schema::FieldSpec;
    use crate::error::StorageError;
    use crate::record::RecordCollection;
    use crate::store::{DocumentRepository, MemoryStore};
    use crate::traits::RecordStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn contacts() -> EntityService {
        let schema = Schema::new("contacts", "Contact")
            .field(FieldSpec::text("name").required())
            .field(FieldSpec::text("phone").required())
            .field(FieldSpec::text("email").email().default_value(json!("")))
            .created_at("createdAt")
            .updated_at("updatedAt");

        EntityService::new(schema, DocumentRepository::new(MemoryStore::new()))
    }

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let service = contacts();

        let a = service
            .create(&json!({"name": "A", "phone": "123"}))
            .await
            .unwrap();
        let b = service
            .create(&json!({"name": "A", "phone": "123"}))
            .await
            .unwrap();

        assert!(!a.id().as_str().is_empty());
        assert_ne!(a.id(), b.id());

        let listed = service.list().await.unwrap();
        assert!(listed.iter().any(|r| r.id() == a.id()));
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn create_sets_timestamps_and_defaults() {
        let service = contacts();
        let record = service
            .create(&json!({"name": " Ana ", "phone": "9", "id": "forged"}))
            .await
            .unwrap();

        assert_ne!(record.id().as_str(), "forged");
        assert_eq!(record.get("name").unwrap(), "Ana");
        assert_eq!(record.get("email").unwrap(), "");
        assert_eq!(record.get("createdAt"), record.get("updatedAt"));
        assert!(record.get("createdAt").unwrap().as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn validate_rejects_invalid_payloads() {
        let service = contacts();

        let err = service
            .validate(&json!({"name": "", "phone": "123"}), Mode::Create)
            .unwrap_err();
        let Error::ValidationFailed(violations) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(violations.mentions("name"));

        let err = service
            .validate(
                &json!({"name": "A", "phone": "1", "email": "not-an-email"}),
                Mode::Create,
            )
            .unwrap_err();
        let Error::ValidationFailed(violations) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(violations.mentions("email"));

        assert!(service.validate(&json!({"phone": "9"}), Mode::Update).is_ok());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let service = contacts();

        for payload in [json!({"name": "B"}), json!({}), json!({"name": ""}), json!([1])] {
            let err = service.update(&id("missing"), &payload).await.unwrap_err();
            assert!(matches!(err, Error::NotFound { .. }), "{payload}: {err:?}");
        }
    }

    #[tokio::test]
    async fn update_merges_and_keeps_id() {
        let service = contacts();
        let created = service
            .create(&json!({"name": "A", "phone": "123"}))
            .await
            .unwrap();

        let updated = service
            .update(created.id(), &json!({"name": "B", "id": "other"}))
            .await
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.get("name").unwrap(), "B");
        assert_eq!(updated.get("phone").unwrap(), "123");
        assert_eq!(updated.get("createdAt"), created.get("createdAt"));

        let stored = service.get(created.id()).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn update_null_clears_optional_field() {
        let service = contacts();
        let created = service
            .create(&json!({"name": "A", "phone": "1", "email": "a@b.co"}))
            .await
            .unwrap();

        let updated = service
            .update(created.id(), &json!({"email": null}))
            .await
            .unwrap();
        assert!(updated.get("email").is_none());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let service = contacts();
        let keep = service
            .create(&json!({"name": "A", "phone": "1"}))
            .await
            .unwrap();
        let gone = service
            .create(&json!({"name": "B", "phone": "2"}))
            .await
            .unwrap();

        let removed = service.delete(gone.id()).await.unwrap();
        assert_eq!(removed, gone);

        let err = service.get(gone.id()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let listed = service.list().await.unwrap();
        assert_eq!(listed, vec![keep]);
    }

    #[tokio::test]
    async fn seed_only_fills_empty_collection() {
        let service = contacts().with_id_generator(SequenceGenerator::new("s"));
        let seeds = [json!({"name": "A", "phone": "1"}), json!({"name": "B", "phone": "2"})];

        assert_eq!(service.seed(&seeds).await.unwrap(), 2);
        assert_eq!(service.seed(&seeds).await.unwrap(), 0);

        let ids: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, ["s1", "s2"]);
    }

    /// A store whose saves can be switched to fail.
    #[derive(Debug, Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn load(&self) -> Result<RecordCollection> {
            self.inner.load().await
        }

        async fn save(&self, collection: &RecordCollection) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::io(
                    "/data/contacts.json",
                    io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
                )
                .into());
            }
            self.inner.save(collection).await
        }
    }

    #[tokio::test]
    async fn failed_save_persists_nothing() {
        let store = FlakyStore::default();
        let service = EntityService::new(
            contacts().schema().clone(),
            DocumentRepository::new(store.clone()),
        );

        let existing = service
            .create(&json!({"name": "A", "phone": "1"}))
            .await
            .unwrap();
        let before = store.load().await.unwrap();

        store.failing.store(true, Ordering::SeqCst);

        let err = service
            .create(&json!({"name": "B", "phone": "2"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(StorageError::Io { .. })));

        let err = service
            .update(existing.id(), &json!({"name": "C"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        let err = service.delete(existing.id()).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));

        assert_eq!(store.load().await.unwrap(), before);
        assert_eq!(service.get(existing.id()).await.unwrap(), existing);
    }
}
