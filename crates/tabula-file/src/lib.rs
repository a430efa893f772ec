//! tabula-file - JSON-file record store.

mod store;

pub use store::JsonFileStore;
