//! Identifier generation for new articles.

use crate::model::article::ArticleId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of globally unique, opaque article identifiers.
pub trait IdGenerator {
    fn new_id(&self) -> ArticleId;
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn new_id(&self) -> ArticleId {
        (**self).new_id()
    }
}

/// Random UUID v4 identifiers, hyphenated lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> ArticleId {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix>-<n>` identifiers, zero-padded so that key order
/// matches creation order.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn new_id(&self) -> ArticleId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n:08}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, SequenceIdGenerator, UuidGenerator};
    use std::collections::HashSet;

    #[test]
    fn uuid_generator_yields_distinct_ids() {
        let ids: HashSet<_> = (0..256).map(|_| UuidGenerator.new_id()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn sequence_generator_is_ordered() {
        let ids = SequenceIdGenerator::new("n");
        let first = ids.new_id();
        let second = ids.new_id();
        assert_eq!(first, "n-00000001");
        assert!(first < second);
    }
}
