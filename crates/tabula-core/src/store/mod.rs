//! Store implementations that live in the core crate.

mod document;
mod memory;

pub use document::DocumentRepository;
pub use memory::MemoryStore;
