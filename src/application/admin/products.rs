use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::admin::{SlugFailure, normalize_optional, resolve_slug};
use crate::application::catalog::CatalogService;
use crate::application::repos::{
    CategoriesRepo, CreateProductParams, ProductFields, ProductsRepo, ProductsWriteRepo,
    RepoError, UpdateProductParams,
};
use crate::cache::QueryFamily;
use crate::domain::entities::ProductRecord;

#[derive(Debug, Error)]
pub enum AdminProductError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("product not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugFailure> for AdminProductError {
    fn from(failure: SlugFailure) -> Self {
        match failure {
            SlugFailure::Unrepresentable => {
                Self::Validation("Product slug must contain letters or digits")
            }
            SlugFailure::Exhausted => Self::Validation("Product slug is already taken"),
            SlugFailure::Repo(err) => Self::Repo(err),
        }
    }
}

/// Field values shared by product create and update commands.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: String,
    /// Derived from `name` when absent or blank.
    pub slug: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub description: Option<String>,
    pub stock: u32,
    pub fabric: Option<String>,
    pub color: Option<String>,
    pub style: Option<String>,
    pub sizes: Vec<String>,
    /// Public image URLs, primary first.
    pub images: Vec<String>,
    pub is_new: bool,
    pub is_sale: bool,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateProductCommand {
    pub input: ProductInput,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProductCommand {
    pub id: Uuid,
    /// An empty image list keeps the stored images.
    pub input: ProductInput,
}

#[derive(Clone)]
pub struct AdminProductService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    catalog: CatalogService,
}

impl AdminProductService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        catalog: CatalogService,
    ) -> Self {
        Self {
            reader,
            writer,
            categories,
            catalog,
        }
    }

    pub async fn create_product(
        &self,
        command: CreateProductCommand,
    ) -> Result<ProductRecord, AdminProductError> {
        let input = command.input;
        validate(&input)?;
        let images = clean_list(input.images.clone());
        if images.is_empty() {
            return Err(AdminProductError::Validation(
                "Please upload at least one product image.",
            ));
        }

        let fields = self.build_fields(input, images, None).await?;
        let product = self
            .writer
            .create_product(CreateProductParams { fields })
            .await?;
        self.catalog.invalidate_family(QueryFamily::Products);
        info!(
            target = "application::admin::products",
            product_id = %product.id,
            slug = %product.slug,
            "product created"
        );
        Ok(product)
    }

    pub async fn update_product(
        &self,
        command: UpdateProductCommand,
    ) -> Result<ProductRecord, AdminProductError> {
        let input = command.input;
        validate(&input)?;

        let existing = self
            .reader
            .find_product_by_id(command.id)
            .await?
            .ok_or(AdminProductError::NotFound)?;

        let mut images = clean_list(input.images.clone());
        if images.is_empty() {
            images = existing.images.clone();
        }

        let fields = self.build_fields(input, images, Some(existing.id)).await?;
        let product = self
            .writer
            .update_product(UpdateProductParams {
                id: existing.id,
                fields,
            })
            .await?;
        self.catalog.invalidate_family(QueryFamily::Products);
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AdminProductError> {
        self.writer.delete_product(id).await.map_err(|err| match err {
            RepoError::NotFound => AdminProductError::NotFound,
            other => AdminProductError::Repo(other),
        })?;
        self.catalog.invalidate_family(QueryFamily::Products);
        Ok(())
    }

    async fn build_fields(
        &self,
        input: ProductInput,
        images: Vec<String>,
        owner: Option<Uuid>,
    ) -> Result<ProductFields, AdminProductError> {
        let category_id = input
            .category_id
            .ok_or(AdminProductError::Validation(MISSING_CATEGORY))?;
        if self
            .categories
            .find_category_by_id(category_id)
            .await?
            .is_none()
        {
            return Err(AdminProductError::Validation(MISSING_CATEGORY));
        }

        let name = input.name.trim().to_string();
        let reader = self.reader.clone();
        let slug = resolve_slug(input.slug.as_deref(), &name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_product_by_slug(&candidate)
                    .await
                    .map(|found| found.is_none_or(|product| Some(product.id) == owner))
            }
        })
        .await?;

        Ok(ProductFields {
            name,
            slug,
            price: input.price,
            discount_price: input.discount_price,
            description: normalize_optional(input.description),
            stock: input.stock,
            fabric: normalize_optional(input.fabric),
            color: normalize_optional(input.color),
            style: normalize_optional(input.style),
            sizes: clean_list(input.sizes),
            images,
            is_new: input.is_new,
            is_sale: input.is_sale,
            category_id,
        })
    }
}

const MISSING_CATEGORY: &str = "Please select a category for the product.";

fn validate(input: &ProductInput) -> Result<(), AdminProductError> {
    if input.name.trim().is_empty() {
        return Err(AdminProductError::Validation("Product name is required"));
    }
    if input.category_id.is_none() {
        return Err(AdminProductError::Validation(MISSING_CATEGORY));
    }
    if input.price <= Decimal::ZERO {
        return Err(AdminProductError::Validation(
            "Product price must be greater than zero",
        ));
    }
    if input
        .discount_price
        .is_some_and(|discount| discount < Decimal::ZERO)
    {
        return Err(AdminProductError::Validation(
            "Discount price cannot be negative",
        ));
    }
    Ok(())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
