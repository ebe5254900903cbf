//! Repository traits describing catalog persistence adapters.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CategoryRecord, ProductRecord, SettingsRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Column values written for a product on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub description: Option<String>,
    pub stock: u32,
    pub fabric: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub sizes: Vec<String>,
    pub images: Vec<String>,
    pub is_new: bool,
    pub is_sale: bool,
    pub category_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub fields: ProductFields,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: Uuid,
    pub fields: ProductFields,
}

#[derive(Debug, Clone)]
pub struct UpdateSettingsParams {
    pub id: Uuid,
    pub whatsapp_number: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub announcement_text: Option<String>,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Product reads. Every listing carries the resolved category and is ordered
/// newest first.
#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError>;

    /// Products whose category slug equals `slug`; an unknown slug yields an
    /// empty list.
    async fn list_products_by_category(&self, slug: &str)
    -> Result<Vec<ProductRecord>, RepoError>;

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError>;

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, RepoError>;

    /// Case-insensitive substring match on product name. `query` is expected
    /// to be trimmed and non-empty.
    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn update_product(&self, params: UpdateProductParams)
    -> Result<ProductRecord, RepoError>;

    async fn delete_product(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    /// The single settings row, if one has been created.
    async fn load_settings(&self) -> Result<Option<SettingsRecord>, RepoError>;

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<SettingsRecord, RepoError>;
}
