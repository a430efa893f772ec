//! Records and record collections.
//!
//! A record is schema-agnostic beyond its `id`; interpretation of the other
//! fields is left to the [`Schema`](crate::Schema) of the entity it belongs to.

mod collection;
mod id;
mod value;

pub use collection::RecordCollection;
pub use id::RecordId;
pub use value::{ID_FIELD, Record};
