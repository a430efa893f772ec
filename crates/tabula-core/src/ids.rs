//! Record id generation.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::record::RecordId;

/// Source of fresh, never-reused record ids.
pub trait IdGenerator: Debug + Send + Sync {
    fn next_id(&self) -> RecordId;
}

/// Random UUID v4 ids. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> RecordId {
        RecordId::new(Uuid::new_v4().to_string()).expect("uuid is never blank")
    }
}

/// Monotonic counter ids: `<prefix>1`, `<prefix>2`, ...
///
/// Unique within one generator instance only; intended for tests and
/// ephemeral stores.
#[derive(Debug)]
pub struct SequenceGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequenceGenerator {
    fn next_id(&self) -> RecordId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        RecordId::new(format!("{}{}", self.prefix, n)).expect("counter id is never blank")
    }
}
