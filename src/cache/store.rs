//! LRU-bounded storage for catalog query results.

use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;

use crate::domain::entities::{CategoryRecord, ProductRecord, SettingsRecord};

use super::config::CacheConfig;
use super::keys::{QueryFamily, QueryKey};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_QUERY_HIT: &str = "vastra_cache_query_hit_total";
pub(crate) const METRIC_QUERY_MISS: &str = "vastra_cache_query_miss_total";
pub(crate) const METRIC_QUERY_EVICT: &str = "vastra_cache_query_evict_total";

/// A cached read result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedQuery {
    Categories(Vec<CategoryRecord>),
    Products(Vec<ProductRecord>),
    Product(Option<ProductRecord>),
    Settings(Option<SettingsRecord>),
}

/// Conversion between a typed read result and its cached form.
pub trait Cacheable: Sized {
    fn into_cached(self) -> CachedQuery;
    fn from_cached(cached: CachedQuery) -> Option<Self>;
}

impl Cacheable for Vec<CategoryRecord> {
    fn into_cached(self) -> CachedQuery {
        CachedQuery::Categories(self)
    }

    fn from_cached(cached: CachedQuery) -> Option<Self> {
        match cached {
            CachedQuery::Categories(value) => Some(value),
            _ => None,
        }
    }
}

impl Cacheable for Vec<ProductRecord> {
    fn into_cached(self) -> CachedQuery {
        CachedQuery::Products(self)
    }

    fn from_cached(cached: CachedQuery) -> Option<Self> {
        match cached {
            CachedQuery::Products(value) => Some(value),
            _ => None,
        }
    }
}

impl Cacheable for Option<ProductRecord> {
    fn into_cached(self) -> CachedQuery {
        CachedQuery::Product(self)
    }

    fn from_cached(cached: CachedQuery) -> Option<Self> {
        match cached {
            CachedQuery::Product(value) => Some(value),
            _ => None,
        }
    }
}

impl Cacheable for Option<SettingsRecord> {
    fn into_cached(self) -> CachedQuery {
        CachedQuery::Settings(self)
    }

    fn from_cached(cached: CachedQuery) -> Option<Self> {
        match cached {
            CachedQuery::Settings(value) => Some(value),
            _ => None,
        }
    }
}

/// Query result cache keyed by `(operation, parameters)`.
///
/// A disabled cache misses on every lookup and drops every insert.
pub struct QueryCache {
    enabled: bool,
    entries: RwLock<LruCache<QueryKey, CachedQuery>>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enable_query_cache,
            entries: RwLock::new(LruCache::new(config.query_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        if !self.enabled {
            return None;
        }

        let cached = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        let operation = key.operation();
        match cached {
            Some(_) => counter!(METRIC_QUERY_HIT, "operation" => operation).increment(1),
            None => counter!(METRIC_QUERY_MISS, "operation" => operation).increment(1),
        }
        cached
    }

    /// Typed lookup; a cached value of the wrong shape counts as a miss.
    pub fn get_as<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        self.get(key).and_then(T::from_cached)
    }

    /// Store a result, returning the key evicted to make room, if any.
    pub fn put(&self, key: QueryKey, value: CachedQuery) -> Option<QueryKey> {
        if !self.enabled {
            return None;
        }

        let evicted = rw_write(&self.entries, SOURCE, "put")
            .push(key.clone(), value)
            .map(|(evicted_key, _)| evicted_key)
            .filter(|evicted_key| *evicted_key != key);

        if let Some(evicted_key) = evicted.as_ref() {
            counter!(METRIC_QUERY_EVICT, "operation" => evicted_key.operation()).increment(1);
        }
        evicted
    }

    pub fn invalidate(&self, key: &QueryKey) {
        rw_write(&self.entries, SOURCE, "invalidate").pop(key);
    }

    /// Drop every entry belonging to `family`.
    pub fn invalidate_family(&self, family: QueryFamily) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_family");
        let stale: Vec<QueryKey> = entries
            .iter()
            .filter(|(key, _)| key.family() == family)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            entries.pop(&key);
        }
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn sample_category(slug: &str) -> CategoryRecord {
        CategoryRecord {
            id: Uuid::new_v4(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: None,
            image: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn typed_roundtrip_through_cache() {
        let cache = QueryCache::new(&CacheConfig::default());
        let categories = vec![sample_category("sarees")];

        assert!(cache.get_as::<Vec<CategoryRecord>>(&QueryKey::Categories).is_none());
        cache.put(QueryKey::Categories, categories.clone().into_cached());

        let cached: Vec<CategoryRecord> = cache
            .get_as(&QueryKey::Categories)
            .expect("cached categories");
        assert_eq!(cached, categories);
        assert!(cache.get_as::<Vec<ProductRecord>>(&QueryKey::Categories).is_none());
    }

    #[test]
    fn lru_eviction_reports_evicted_key() {
        let config = CacheConfig {
            query_limit: 2,
            ..Default::default()
        };
        let cache = QueryCache::new(&config);

        cache.put(QueryKey::Search("silk".into()), CachedQuery::Products(vec![]));
        cache.put(QueryKey::Search("cotton".into()), CachedQuery::Products(vec![]));
        let evicted = cache.put(QueryKey::Search("linen".into()), CachedQuery::Products(vec![]));

        assert_eq!(evicted, Some(QueryKey::Search("silk".into())));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_an_entry_is_not_an_eviction() {
        let cache = QueryCache::new(&CacheConfig::default());
        cache.put(QueryKey::Settings, CachedQuery::Settings(None));
        assert_eq!(
            cache.put(QueryKey::Settings, CachedQuery::Settings(None)),
            None
        );
    }

    #[test]
    fn family_invalidation_leaves_other_families() {
        let cache = QueryCache::new(&CacheConfig::default());
        cache.put(QueryKey::Categories, CachedQuery::Categories(vec![]));
        cache.put(QueryKey::Products, CachedQuery::Products(vec![]));
        cache.put(
            QueryKey::ProductsByCategory("sarees".into()),
            CachedQuery::Products(vec![]),
        );
        cache.put(QueryKey::ProductBySlug("x".into()), CachedQuery::Product(None));

        cache.invalidate_family(QueryFamily::Products);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&QueryKey::Categories).is_some());
    }

    #[test]
    fn disabled_cache_never_stores() {
        let config = CacheConfig {
            enable_query_cache: false,
            ..Default::default()
        };
        let cache = QueryCache::new(&config);
        cache.put(QueryKey::Products, CachedQuery::Products(vec![]));
        assert!(cache.get(&QueryKey::Products).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn poisoned_lock_recovers() {
        let cache = QueryCache::new(&CacheConfig::default());
        cache.put(QueryKey::Categories, CachedQuery::Categories(vec![]));

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("lock");
            panic!("poison the cache lock");
        }));

        assert!(cache.entries.is_poisoned());
        assert!(cache.get(&QueryKey::Categories).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }
}
