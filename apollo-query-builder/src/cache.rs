//! Caches parsed schemas by SDL text.
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::SchemaError;
use crate::schema::Schema;

pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Bounded LRU cache of parsed schemas, keyed by the raw SDL.
///
/// Entries are shared as `Arc<Schema>` and never modified once inserted.
/// Parsing happens outside the lock, so concurrent callers missing on the same
/// SDL may both parse it; the first insertion wins. Errors are not cached.
pub struct SchemaCache {
    cached: Mutex<LruCache<String, Arc<Schema>>>,
}

impl SchemaCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cached: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get_or_parse(&self, sdl: &str) -> Result<Arc<Schema>, SchemaError> {
        if let Some(schema) = self.cached.lock().get(sdl) {
            tracing::trace!("schema cache hit");
            return Ok(schema.clone());
        }

        tracing::debug!("schema cache miss, parsing schema");
        let schema = Arc::new(Schema::parse(sdl)?);
        let mut cached = self.cached.lock();
        Ok(cached.get_or_insert(sdl.to_string(), || schema).clone())
    }

    pub fn len(&self) -> usize {
        self.cached.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cached.lock().is_empty()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cached.lock();
        f.debug_struct("SchemaCache")
            .field("len", &cached.len())
            .field("cap", &cached.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    const SCHEMA: &str = "type Query { a: Int }";

    #[test]
    fn returns_the_same_schema_for_the_same_text() {
        let cache = SchemaCache::default();
        let first = cache.get_or_parse(SCHEMA).unwrap();
        let second = cache.get_or_parse(SCHEMA).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SchemaCache::default();
        assert!(cache.get_or_parse("type Query {").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = SchemaCache::new(NonZeroUsize::new(1).unwrap());
        let first = cache.get_or_parse(SCHEMA).unwrap();
        cache.get_or_parse("type Query { b: Int }").unwrap();
        let again = cache.get_or_parse(SCHEMA).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_entry() {
        let cache = Arc::new(SchemaCache::default());
        let schemas: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get_or_parse(SCHEMA).unwrap())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(cache.len(), 1);
        let cached = cache.get_or_parse(SCHEMA).unwrap();
        assert!(
            schemas
                .iter()
                .all(|schema| schema.as_string() == cached.as_string())
        );
    }
}
