//! Cached, ordered access to catalog reads.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::repos::{CategoriesRepo, ProductsRepo, RepoError, SettingsRepo};
use crate::cache::{CacheConfig, Cacheable, QueryCache, QueryFamily, QueryKey, RequestGenerations};
use crate::domain::entities::{CategoryRecord, ProductRecord, SettingsRecord};

const SOURCE: &str = "application::catalog";
const METRIC_SUPERSEDED: &str = "vastra_catalog_superseded_total";

/// Front door for every catalog read.
///
/// Results are cached per [`QueryKey`] until a caller invalidates them. When
/// several requests for the same key overlap, only the last one issued may
/// populate the cache; an older response that finishes later resolves to the
/// newer cached result instead of overwriting it.
#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn CategoriesRepo>,
    products: Arc<dyn ProductsRepo>,
    settings: Arc<dyn SettingsRepo>,
    cache: Arc<QueryCache>,
    generations: Arc<RequestGenerations>,
}

impl CatalogService {
    pub fn new(
        categories: Arc<dyn CategoriesRepo>,
        products: Arc<dyn ProductsRepo>,
        settings: Arc<dyn SettingsRepo>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            categories,
            products,
            settings,
            cache: Arc::new(QueryCache::new(cache_config)),
            generations: Arc::new(RequestGenerations::new()),
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.read(QueryKey::Categories, self.categories.list_categories())
            .await
    }

    pub async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.read(QueryKey::Products, self.products.list_products())
            .await
    }

    pub async fn list_products_by_category(
        &self,
        slug: &str,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        self.read(
            QueryKey::ProductsByCategory(slug.to_string()),
            self.products.list_products_by_category(slug),
        )
        .await
    }

    pub async fn find_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductRecord>, RepoError> {
        self.read(
            QueryKey::ProductBySlug(slug.to_string()),
            self.products.find_product_by_slug(slug),
        )
        .await
    }

    /// Name search. A blank query matches nothing and never reaches the
    /// repository.
    pub async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, RepoError> {
        let term = query.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        self.read(
            QueryKey::Search(term.to_string()),
            self.products.search_products(term),
        )
        .await
    }

    pub async fn load_settings(&self) -> Result<Option<SettingsRecord>, RepoError> {
        self.read(QueryKey::Settings, self.settings.load_settings())
            .await
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.cache.invalidate(key);
    }

    /// Drop cached results for a family and supersede its in-flight reads.
    pub fn invalidate_family(&self, family: QueryFamily) {
        self.generations.retire_family(family);
        self.cache.invalidate_family(family);
    }

    pub fn invalidate_all(&self) {
        self.generations.retire_all();
        self.cache.clear();
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn read<T, Fut>(&self, key: QueryKey, fetch: Fut) -> Result<T, RepoError>
    where
        T: Cacheable + Clone,
        Fut: Future<Output = Result<T, RepoError>>,
    {
        if let Some(hit) = self.cache.get_as::<T>(&key) {
            return Ok(hit);
        }

        let ticket = self.generations.issue(key.clone());
        let result = fetch.await;
        let current = self.generations.complete(&ticket);

        let value = result.inspect_err(|err| {
            warn!(
                target = SOURCE,
                op = key.operation(),
                error = %err,
                "catalog read failed"
            );
        })?;

        if current {
            self.cache.put(key, value.clone().into_cached());
            return Ok(value);
        }

        counter!(METRIC_SUPERSEDED, "operation" => key.operation()).increment(1);
        debug!(
            target = SOURCE,
            op = key.operation(),
            result = "superseded",
            "discarding response from superseded catalog read"
        );
        Ok(self.cache.get_as::<T>(&key).unwrap_or(value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct StubCatalog {
        categories: Vec<CategoryRecord>,
        products: Vec<ProductRecord>,
        product_calls: AtomicUsize,
        search_calls: AtomicUsize,
        fail_products: Mutex<bool>,
    }

    fn product(name: &str, category: Option<&CategoryRecord>) -> ProductRecord {
        ProductRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            price: dec!(1000),
            discount_price: None,
            description: None,
            stock: 3,
            fabric: None,
            color: None,
            style: None,
            sizes: Vec::new(),
            images: Vec::new(),
            is_new: false,
            is_sale: false,
            category_id: category.map(|c| c.id),
            category: category.cloned(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn category(slug: &str) -> CategoryRecord {
        CategoryRecord {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            image: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[async_trait]
    impl CategoriesRepo for StubCatalog {
        async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
            Ok(self.categories.clone())
        }

        async fn find_category_by_slug(
            &self,
            slug: &str,
        ) -> Result<Option<CategoryRecord>, RepoError> {
            Ok(self.categories.iter().find(|c| c.slug == slug).cloned())
        }

        async fn find_category_by_id(
            &self,
            id: Uuid,
        ) -> Result<Option<CategoryRecord>, RepoError> {
            Ok(self.categories.iter().find(|c| c.id == id).cloned())
        }
    }

    #[async_trait]
    impl ProductsRepo for StubCatalog {
        async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_products.lock().expect("lock") {
                return Err(RepoError::from_persistence("backend down"));
            }
            Ok(self.products.clone())
        }

        async fn list_products_by_category(
            &self,
            slug: &str,
        ) -> Result<Vec<ProductRecord>, RepoError> {
            Ok(self
                .products
                .iter()
                .filter(|p| p.category_slug() == Some(slug))
                .cloned()
                .collect())
        }

        async fn find_product_by_slug(
            &self,
            slug: &str,
        ) -> Result<Option<ProductRecord>, RepoError> {
            Ok(self.products.iter().find(|p| p.slug == slug).cloned())
        }

        async fn find_product_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, RepoError> {
            Ok(self.products.iter().find(|p| p.id == id).cloned())
        }

        async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, RepoError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            let needle = query.to_lowercase();
            Ok(self
                .products
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl SettingsRepo for StubCatalog {
        async fn load_settings(&self) -> Result<Option<SettingsRecord>, RepoError> {
            Ok(None)
        }

        async fn update_settings(
            &self,
            _params: crate::application::repos::UpdateSettingsParams,
        ) -> Result<SettingsRecord, RepoError> {
            Err(RepoError::NotFound)
        }
    }

    fn service(stub: Arc<StubCatalog>) -> CatalogService {
        CatalogService::new(
            stub.clone(),
            stub.clone(),
            stub,
            &CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn blank_search_skips_backend() {
        let stub = Arc::new(StubCatalog::default());
        let catalog = service(stub.clone());

        assert!(catalog.search_products("").await.expect("search").is_empty());
        assert!(catalog.search_products("   ").await.expect("search").is_empty());
        assert_eq!(stub.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_trims_and_matches_case_insensitively() {
        let stub = Arc::new(StubCatalog {
            products: vec![product("Red Silk Saree", None), product("Cotton Kurta", None)],
            ..Default::default()
        });
        let catalog = service(stub.clone());

        let results = catalog.search_products("  SILK ").await.expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Red Silk Saree");
    }

    #[tokio::test]
    async fn unknown_category_slug_is_empty_not_error() {
        let sarees = category("sarees");
        let stub = Arc::new(StubCatalog {
            products: vec![product("Red Silk Saree", Some(&sarees))],
            categories: vec![sarees],
            ..Default::default()
        });
        let catalog = service(stub);

        let products = catalog
            .list_products_by_category("does-not-exist")
            .await
            .expect("listing");
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn repeated_reads_hit_cache_until_invalidated() {
        let stub = Arc::new(StubCatalog {
            products: vec![product("Red Silk Saree", None)],
            ..Default::default()
        });
        let catalog = service(stub.clone());

        catalog.list_products().await.expect("first read");
        catalog.list_products().await.expect("second read");
        assert_eq!(stub.product_calls.load(Ordering::SeqCst), 1);

        catalog.invalidate_family(QueryFamily::Products);
        catalog.list_products().await.expect("third read");
        assert_eq!(stub.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_surface_and_are_not_cached() {
        let stub = Arc::new(StubCatalog::default());
        *stub.fail_products.lock().expect("lock") = true;
        let catalog = service(stub.clone());

        assert!(catalog.list_products().await.is_err());
        assert!(catalog.cache().get(&QueryKey::Products).is_none());

        *stub.fail_products.lock().expect("lock") = false;
        assert!(catalog.list_products().await.is_ok());
    }
}
