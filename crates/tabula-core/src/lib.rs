//! tabula-core - Core record types, schemas and the entity service.
//!
//! Storage media live in sibling crates (`tabula-file`, `tabula-sqlite`)
//! and plug in through the [`RecordStore`] and [`Repository`] traits.

pub mod error;
pub mod ids;
pub mod record;
pub mod schema;
pub mod service;
pub mod store;
pub mod traits;
pub mod validate;

pub use error::{Error, InvalidInputError, StorageError};
pub use ids::{IdGenerator, SequenceGenerator, UuidGenerator};
pub use record::{ID_FIELD, Record, RecordCollection, RecordId};
pub use schema::{FieldKind, FieldSpec, Format, Mode, Schema};
pub use service::{EntityService, timestamp};
pub use store::{DocumentRepository, MemoryStore};
pub use traits::{RecordStore, Repository};
pub use validate::{Validator, Violation, Violations};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
