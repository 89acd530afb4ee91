//! Process-wide regex compile cache, keyed by `(rule_id, predicate_index)`
//! (spec.md §4.2 "Regex compilation is cached per (rule-id,
//! predicate-index)", §5 "bounded by LRU").
//!
//! Grounded in the teacher's `ShardedLruCache` in
//! `router-core/src/app/gateway_fast.rs`: several independently-locked LRU
//! shards reduce contention versus one global lock, at the cost of a
//! slightly looser global LRU ordering — an acceptable tradeoff for a
//! compile cache that is read far more often than it is evicted from.

use lru::LruCache;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const SHARD_COUNT: usize = 16;

type CacheKey = (String, usize);

/// A sharded LRU cache mapping `(rule_id, predicate_index)` to a compiled,
/// case-insensitive regex (or `None` if the pattern failed to compile —
/// spec.md §4.2 "on compile error the predicate is false, never throws").
pub struct RegexCache {
    shards: Vec<Mutex<LruCache<CacheKey, Option<Arc<Regex>>>>>,
}

impl RegexCache {
    pub fn new(total_capacity: usize) -> Self {
        let per_shard = (total_capacity / SHARD_COUNT).max(1);
        let capacity = NonZeroUsize::new(per_shard).unwrap();
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(LruCache::new(capacity)))
            .collect();
        Self { shards }
    }

    fn shard_index(key: &CacheKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % SHARD_COUNT
    }

    /// Returns the compiled regex for `(rule_id, predicate_index)`,
    /// compiling and caching it (case-insensitively) on first use. Returns
    /// `None` if the pattern does not compile; callers treat that as a
    /// non-matching predicate rather than propagating an error.
    pub fn get_or_compile(&self, rule_id: &str, predicate_index: usize, pattern: &str) -> Option<Arc<Regex>> {
        let key = (rule_id.to_string(), predicate_index);
        let idx = Self::shard_index(&key);
        let mut shard = self.shards[idx].lock().unwrap();

        if let Some(cached) = shard.get(&key) {
            return cached.clone();
        }

        let compiled = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .ok()
            .map(Arc::new);
        shard.put(key, compiled.clone());
        compiled
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new(waf_common::REGEX_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_compiled_regex() {
        let cache = RegexCache::new(32);
        let first = cache.get_or_compile("rule-1", 0, "^abc");
        assert!(first.is_some());
        let second = cache.get_or_compile("rule-1", 0, "^abc");
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[test]
    fn invalid_pattern_caches_none_without_panicking() {
        let cache = RegexCache::new(32);
        assert!(cache.get_or_compile("rule-2", 0, "(").is_none());
        assert!(cache.get_or_compile("rule-2", 0, "(").is_none());
    }

    #[test]
    fn is_case_insensitive() {
        let cache = RegexCache::new(32);
        let re = cache.get_or_compile("rule-3", 0, "tor").unwrap();
        assert!(re.is_match("TOR-EXIT-NODE"));
    }
}
