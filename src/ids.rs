//! Record identifier generation
//!
//! The store never mints ids itself; it asks an [`IdGenerator`] handed to it
//! at construction. Production uses random UUIDs, tests can plug in
//! [`SequentialIdGenerator`] for predictable ids.

use std::sync::atomic::{AtomicU64, Ordering};

/// Produces identifiers that are unique for the lifetime of the process.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random version 4 UUIDs (122 random bits).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic ids of the form `{prefix}-{n}`, starting at 1.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("user")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
