//! The two-level `source_name -> identity -> value` cache.
//!
//! The outer level is never collapsed into the inner one: it is the pivot
//! the frontier analyzer groups by, and the runner's batch/single dispatch
//! decision for a group depends on counting *misses within that one outer
//! key*, not across the whole cache.

use std::collections::HashMap;

use crate::source::{CacheKey, ErasedSource, SourceName};
use crate::value::AnyValue;

/// The run's cache: grows monotonically, never removes keys, and is
/// returned to the caller alongside the final value.
#[derive(Default)]
pub struct Cache {
    entries: HashMap<SourceName, HashMap<CacheKey, AnyValue>>,
}

impl Cache {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build a cache from a user-provided set of `(source_name, identity,
    /// value)` triples, typically produced with [`crate::source::resource_name`]
    /// and [`crate::source::cache_id`].
    pub fn seed(entries: impl IntoIterator<Item = (SourceName, CacheKey, AnyValue)>) -> Self {
        let mut cache = Self::new();
        for (source_name, key, value) in entries {
            cache.insert(source_name, key, value);
        }
        cache
    }

    /// Look up a cached value by source name and identity.
    pub fn lookup(&self, source_name: &SourceName, key: &CacheKey) -> Option<&AnyValue> {
        self.entries.get(source_name)?.get(key)
    }

    /// Look up a cached value for an `ErasedSource`, as a convenience over
    /// `lookup(&s.source_name(), &s.cache_key())`.
    pub fn lookup_source(&self, s: &dyn ErasedSource) -> Option<&AnyValue> {
        self.lookup(&s.source_name(), &s.cache_key())
    }

    /// Insert a resolved value, overwriting any prior entry for the same
    /// key.
    pub fn insert(&mut self, source_name: SourceName, key: CacheKey, value: AnyValue) {
        self.entries.entry(source_name).or_default().insert(key, value);
    }

    /// Whether this cache has an entry for every key in `other` with an
    /// equal-or-superset relationship — used to assert cache monotonicity
    /// in tests.
    pub fn is_superset_of(&self, other: &Cache) -> bool {
        other.entries.iter().all(|(name, inner)| {
            inner.keys().all(|key| {
                self.entries
                    .get(name)
                    .map(|mine| mine.contains_key(key))
                    .unwrap_or(false)
            })
        })
    }

    /// Total number of cached entries across all source names.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
