#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tokio::sync::oneshot;
use uuid::Uuid;
use vastra::application::catalog::CatalogService;
use vastra::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, CreateProductParams, ProductFields,
    ProductsRepo, ProductsWriteRepo, RepoError, SettingsRepo, UpdateCategoryParams,
    UpdateProductParams, UpdateSettingsParams,
};
use vastra::cache::CacheConfig;
use vastra::domain::entities::{CategoryRecord, ProductRecord, SettingsRecord};

pub fn category(name: &str, slug: &str) -> CategoryRecord {
    CategoryRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: slug.to_string(),
        description: None,
        image: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// A product created `minutes_ago`, with a slug derived from its name.
pub fn product(name: &str, price: Decimal, minutes_ago: i64) -> ProductRecord {
    ProductRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        price,
        discount_price: None,
        description: None,
        stock: 10,
        fabric: None,
        color: None,
        style: None,
        sizes: Vec::new(),
        images: vec![format!("https://cdn.example/{}.jpg", name.to_lowercase())],
        is_new: false,
        is_sale: false,
        category_id: None,
        category: None,
        created_at: OffsetDateTime::now_utc() - Duration::minutes(minutes_ago),
    }
}

pub fn in_category(mut product: ProductRecord, category: &CategoryRecord) -> ProductRecord {
    product.category_id = Some(category.id);
    product
}

pub fn settings(whatsapp_number: Option<&str>) -> SettingsRecord {
    SettingsRecord {
        id: Uuid::new_v4(),
        whatsapp_number: whatsapp_number.map(str::to_string),
        hero_title: Some("Festive Edit".to_string()),
        hero_subtitle: None,
        announcement_text: Some("  Free shipping above ₹2,999  ".to_string()),
        created_at: OffsetDateTime::now_utc(),
    }
}

/// Catalog held in memory, implementing every repository trait.
#[derive(Default)]
pub struct InMemoryCatalog {
    categories: Mutex<Vec<CategoryRecord>>,
    products: Mutex<Vec<ProductRecord>>,
    settings: Mutex<Option<SettingsRecord>>,
    pub fail_categories: AtomicBool,
    pub fail_products: AtomicBool,
    pub fail_settings: AtomicBool,
    pub product_reads: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new(
        categories: Vec<CategoryRecord>,
        products: Vec<ProductRecord>,
        settings: Option<SettingsRecord>,
    ) -> Arc<Self> {
        Arc::new(Self {
            categories: Mutex::new(categories),
            products: Mutex::new(products),
            settings: Mutex::new(settings),
            ..Default::default()
        })
    }

    pub fn catalog_service(self: &Arc<Self>) -> CatalogService {
        CatalogService::new(
            self.clone(),
            self.clone(),
            self.clone(),
            &CacheConfig::default(),
        )
    }

    pub fn stored_products(&self) -> Vec<ProductRecord> {
        self.products.lock().expect("lock").clone()
    }

    fn check(flag: &AtomicBool) -> Result<(), RepoError> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("backend unavailable"));
        }
        Ok(())
    }

    /// Products newest first, joined with their category.
    fn joined<F>(&self, keep: F) -> Vec<ProductRecord>
    where
        F: Fn(&ProductRecord, Option<&CategoryRecord>) -> bool,
    {
        let categories = self.categories.lock().expect("lock").clone();
        let mut products: Vec<ProductRecord> = self
            .products
            .lock()
            .expect("lock")
            .iter()
            .cloned()
            .map(|mut product| {
                product.category = product
                    .category_id
                    .and_then(|id| categories.iter().find(|c| c.id == id).cloned());
                product
            })
            .filter(|product| keep(product, product.category.as_ref()))
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products
    }

    fn record_from_fields(&self, id: Uuid, fields: ProductFields) -> ProductRecord {
        ProductRecord {
            id,
            name: fields.name,
            slug: fields.slug,
            price: fields.price,
            discount_price: fields.discount_price,
            description: fields.description,
            stock: fields.stock,
            fabric: fields.fabric,
            color: fields.color,
            style: fields.style,
            sizes: fields.sizes,
            images: fields.images,
            is_new: fields.is_new,
            is_sale: fields.is_sale,
            category_id: Some(fields.category_id),
            category: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
impl CategoriesRepo for InMemoryCatalog {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Self::check(&self.fail_categories)?;
        let mut categories = self.categories.lock().expect("lock").clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Self::check(&self.fail_categories)?;
        Ok(self
            .categories
            .lock()
            .expect("lock")
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        Self::check(&self.fail_categories)?;
        Ok(self
            .categories
            .lock()
            .expect("lock")
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

#[async_trait]
impl CategoriesWriteRepo for InMemoryCatalog {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let record = CategoryRecord {
            id: Uuid::new_v4(),
            name: params.name,
            slug: params.slug,
            description: params.description,
            image: params.image,
            created_at: OffsetDateTime::now_utc(),
        };
        self.categories.lock().expect("lock").push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut categories = self.categories.lock().expect("lock");
        let existing = categories
            .iter_mut()
            .find(|c| c.id == params.id)
            .ok_or(RepoError::NotFound)?;
        existing.name = params.name;
        existing.slug = params.slug;
        existing.description = params.description;
        existing.image = params.image;
        Ok(existing.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let mut categories = self.categories.lock().expect("lock");
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(RepoError::NotFound);
        }
        for product in self.products.lock().expect("lock").iter_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProductsRepo for InMemoryCatalog {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        Self::check(&self.fail_products)?;
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.joined(|_, _| true))
    }

    async fn list_products_by_category(
        &self,
        slug: &str,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        Self::check(&self.fail_products)?;
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.joined(|_, category| category.is_some_and(|c| c.slug == slug)))
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        Self::check(&self.fail_products)?;
        Ok(self.joined(|p, _| p.slug == slug).into_iter().next())
    }

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, RepoError> {
        Self::check(&self.fail_products)?;
        Ok(self.joined(|p, _| p.id == id).into_iter().next())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, RepoError> {
        Self::check(&self.fail_products)?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let needle = query.to_lowercase();
        Ok(self.joined(|p, _| p.name.to_lowercase().contains(&needle)))
    }
}

#[async_trait]
impl ProductsWriteRepo for InMemoryCatalog {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let record = self.record_from_fields(Uuid::new_v4(), params.fields);
        self.products.lock().expect("lock").push(record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let updated = self.record_from_fields(params.id, params.fields);
        let mut products = self.products.lock().expect("lock");
        let existing = products
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), RepoError> {
        let mut products = self.products.lock().expect("lock");
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepo for InMemoryCatalog {
    async fn load_settings(&self) -> Result<Option<SettingsRecord>, RepoError> {
        Self::check(&self.fail_settings)?;
        Ok(self.settings.lock().expect("lock").clone())
    }

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<SettingsRecord, RepoError> {
        let mut settings = self.settings.lock().expect("lock");
        let existing = settings
            .as_mut()
            .filter(|s| s.id == params.id)
            .ok_or(RepoError::NotFound)?;
        existing.whatsapp_number = params.whatsapp_number;
        existing.hero_title = params.hero_title;
        existing.hero_subtitle = params.hero_subtitle;
        existing.announcement_text = params.announcement_text;
        Ok(existing.clone())
    }
}

/// Product reads that complete only when the test releases them, in call
/// order.
#[derive(Default)]
pub struct GatedProducts {
    gates: Mutex<VecDeque<oneshot::Receiver<Vec<ProductRecord>>>>,
    started: AtomicUsize,
}

impl GatedProducts {
    /// Queue a gate for the next `list_products` call.
    pub fn gate(&self) -> oneshot::Sender<Vec<ProductRecord>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("lock").push_back(rx);
        tx
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Yield until `count` reads have reached the repository.
    pub async fn wait_for_started(&self, count: usize) {
        while self.started() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ProductsRepo for GatedProducts {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        let gate = self.gates.lock().expect("lock").pop_front();
        self.started.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(gate) => gate
                .await
                .map_err(|_| RepoError::from_persistence("gate dropped")),
            None => Err(RepoError::from_persistence("no gate queued")),
        }
    }

    async fn list_products_by_category(
        &self,
        _slug: &str,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_product_by_slug(&self, _slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        Ok(None)
    }

    async fn find_product_by_id(&self, _id: Uuid) -> Result<Option<ProductRecord>, RepoError> {
        Ok(None)
    }

    async fn search_products(&self, _query: &str) -> Result<Vec<ProductRecord>, RepoError> {
        Ok(Vec::new())
    }
}
