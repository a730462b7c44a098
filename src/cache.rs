// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Layout cache
//!
//! A bounded store of previously-built layout results, keyed by the combined
//! hash of layout parameters, attribute spans and text content. `get` reuses
//! an identical layout instead of rebuilding it; `compact` reclaims entries
//! untouched since the previous `compact` call. The cache does not evict on
//! its own — an embedder that never calls `compact` simply keeps every
//! layout it has ever built until the cache itself is dropped.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Combine layout parameters, attribute spans and text into the 64-bit key
/// [`LayoutCache`] is addressed by
///
/// Built purely from [`Hash`] impls via [`DefaultHasher`], so it is stable
/// across calls: two equal `(layout_params, attribute_spans, text)` triples
/// always hash to the same key, regardless of process, allocation addresses
/// or call order.
pub fn cache_key<P: Hash, A: Hash>(layout_params: &P, attribute_spans: &[A], text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    layout_params.hash(&mut hasher);
    attribute_spans.hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}

struct Entry<V> {
    value: V,
    touched: bool,
}

/// A bounded cache of built layout values, keyed by [`cache_key`]
///
/// The cache is single-threaded: it does not attempt to deduplicate
/// concurrent builds of the same key, since there is only ever one caller.
/// Identical keys always map to structurally identical values, since the
/// key is a hash of everything the build depends on.
pub struct LayoutCache<V> {
    entries: HashMap<u64, Entry<V>>,
}

impl<V> Default for LayoutCache<V> {
    fn default() -> Self {
        LayoutCache {
            entries: HashMap::new(),
        }
    }
}

impl<V> LayoutCache<V> {
    /// Construct an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently cached
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the entry for `key`, building it via `build` on a cache miss
    ///
    /// Marks the entry as accessed, so a following `compact` will retain it.
    pub fn get(&mut self, key: u64, build: impl FnOnce() -> V) -> &V {
        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            value: build(),
            touched: false,
        });
        entry.touched = true;
        &entry.value
    }

    /// Evict entries not accessed (via [`Self::get`]) since the previous
    /// `compact` call
    ///
    /// Calling this is the caller's responsibility: nothing here triggers it
    /// implicitly. A typical embedder calls it once per frame.
    pub fn compact(&mut self) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| std::mem::replace(&mut entry.touched, false));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::debug!("layout cache: evicted {evicted} stale entries");
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_is_stable_across_calls() {
        let params = (12u32, 34u32);
        let attrs = [1u8, 2, 3];
        let a = cache_key(&params, &attrs, "hello");
        let b = cache_key(&params.clone(), &attrs.clone(), "hello");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_on_text_change() {
        let params = (1u32, 2u32);
        let attrs: [u8; 0] = [];
        let a = cache_key(&params, &attrs, "hello");
        let b = cache_key(&params, &attrs, "world");
        assert_ne!(a, b);
    }

    #[test]
    fn get_reuses_existing_entry() {
        let mut cache = LayoutCache::new();
        let mut builds = 0;
        let key = cache_key(&1u32, &[0u8; 0], "x");
        let _ = cache.get(key, || {
            builds += 1;
            "built"
        });
        let _ = cache.get(key, || {
            builds += 1;
            "built"
        });
        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn compact_evicts_untouched_entries() {
        let mut cache = LayoutCache::new();
        let k1 = cache_key(&1u32, &[0u8; 0], "a");
        let k2 = cache_key(&2u32, &[0u8; 0], "b");
        let _ = cache.get(k1, || "a");
        let _ = cache.get(k2, || "b");
        assert_eq!(cache.len(), 2);

        cache.compact(); // both touched once, both survive, flags reset
        assert_eq!(cache.len(), 2);

        let _ = cache.get(k1, || "a"); // only k1 touched before next compact
        cache.compact();
        assert_eq!(cache.len(), 1);
    }
}
