use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::client::keys::QueryKey;

/// Result of a cache read. Stale entries are still returned so callers can
/// render immediately and refetch in the background.
#[derive(Debug, PartialEq)]
pub enum CacheLookup<'a> {
    Fresh(&'a Value),
    Stale(&'a Value),
    Miss,
}

struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    invalidated: bool,
}

/// Query cache with a fixed staleness window. Invalidation marks entries
/// stale rather than dropping them.
pub struct QueryCache {
    stale_after: Duration,
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    /// Default staleness window used by the resource clients.
    pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &QueryKey) -> CacheLookup<'_> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &QueryKey, now: Instant) -> CacheLookup<'_> {
        match self.entries.get(key) {
            None => CacheLookup::Miss,
            Some(entry) => {
                if entry.invalidated || now.duration_since(entry.fetched_at) >= self.stale_after {
                    CacheLookup::Stale(&entry.value)
                } else {
                    CacheLookup::Fresh(&entry.value)
                }
            }
        }
    }

    pub fn set(&mut self, key: QueryKey, value: Value) {
        self.set_at(key, value, Instant::now());
    }

    pub fn set_at(&mut self, key: QueryKey, value: Value, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                invalidated: false,
            },
        );
    }

    pub fn remove(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Mark every entry under the prefix stale. Returns how many were hit.
    pub fn invalidate_prefix(&mut self, prefix: &QueryKey) -> usize {
        let mut hit = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.starts_with(prefix) && !entry.invalidated {
                entry.invalidated = true;
                hit += 1;
            }
        }
        hit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STALE_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::keys::portfolios;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn fresh_within_window_stale_after() {
        let mut cache = QueryCache::new(Duration::from_secs(30));
        let key = portfolios::lists();
        let now = Instant::now();
        cache.set_at(key.clone(), json!([1, 2]), now);

        assert_eq!(cache.get_at(&key, now), CacheLookup::Fresh(&json!([1, 2])));
        assert_eq!(
            cache.get_at(&key, now + Duration::from_secs(31)),
            CacheLookup::Stale(&json!([1, 2]))
        );
    }

    #[test]
    fn miss_for_unknown_key() {
        let cache = QueryCache::default();
        assert_eq!(cache.get(&portfolios::lists()), CacheLookup::Miss);
    }

    #[test]
    fn invalidation_marks_stale_without_dropping() {
        let mut cache = QueryCache::new(Duration::from_secs(3600));
        let now = Instant::now();
        let a = portfolios::list("mine");
        let b = portfolios::list("public");
        let detail = portfolios::detail(Uuid::new_v4());
        cache.set_at(a.clone(), json!(1), now);
        cache.set_at(b.clone(), json!(2), now);
        cache.set_at(detail.clone(), json!(3), now);

        // Wholesale list invalidation leaves details alone.
        assert_eq!(cache.invalidate_prefix(&portfolios::lists()), 2);
        assert!(matches!(cache.get_at(&a, now), CacheLookup::Stale(_)));
        assert!(matches!(cache.get_at(&b, now), CacheLookup::Stale(_)));
        assert!(matches!(cache.get_at(&detail, now), CacheLookup::Fresh(_)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn set_clears_the_invalidated_flag() {
        let mut cache = QueryCache::new(Duration::from_secs(3600));
        let key = portfolios::lists();
        let now = Instant::now();
        cache.set_at(key.clone(), json!(1), now);
        cache.invalidate_prefix(&portfolios::all());
        cache.set_at(key.clone(), json!(2), now);
        assert_eq!(cache.get_at(&key, now), CacheLookup::Fresh(&json!(2)));
    }
}
