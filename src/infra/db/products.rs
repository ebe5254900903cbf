use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateProductParams, ProductFields, ProductsRepo, ProductsWriteRepo, RepoError,
        UpdateProductParams,
    },
    domain::entities::{CategoryRecord, ProductRecord},
};

use super::{
    PostgresRepositories, map_sqlx_error,
    util::{contains_pattern, stock_from_db, stock_to_db},
};

/// Products joined with their (optional) category, newest first.
const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.slug, p.price, p.discount_price, \
        p.description, p.stock, p.fabric, p.color, p.style, p.sizes, p.images, \
        p.is_new, p.is_sale, p.category_id, p.created_at, \
        c.id AS category_ref, c.name AS category_name, c.slug AS category_slug, \
        c.description AS category_description, c.image AS category_image, \
        c.created_at AS category_created_at \
    FROM products p \
    LEFT JOIN categories c ON c.id = p.category_id";

const PRODUCT_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    description: Option<String>,
    stock: i32,
    fabric: Option<String>,
    color: Option<String>,
    style: Option<String>,
    sizes: Vec<String>,
    images: Vec<String>,
    is_new: bool,
    is_sale: bool,
    category_id: Option<Uuid>,
    created_at: OffsetDateTime,
    category_ref: Option<Uuid>,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_description: Option<String>,
    category_image: Option<String>,
    category_created_at: Option<OffsetDateTime>,
}

impl ProductRow {
    fn take_category(&mut self) -> Option<CategoryRecord> {
        match (
            self.category_ref,
            self.category_name.take(),
            self.category_slug.take(),
            self.category_created_at,
        ) {
            (Some(id), Some(name), Some(slug), Some(created_at)) => Some(CategoryRecord {
                id,
                name,
                slug,
                description: self.category_description.take(),
                image: self.category_image.take(),
                created_at,
            }),
            _ => None,
        }
    }
}

impl From<ProductRow> for ProductRecord {
    fn from(mut row: ProductRow) -> Self {
        let category = row.take_category();
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: row.price,
            discount_price: row.discount_price,
            description: row.description,
            stock: stock_from_db(row.stock),
            fabric: row.fabric,
            color: row.color,
            style: row.style,
            sizes: row.sizes,
            images: row.images,
            is_new: row.is_new,
            is_sale: row.is_sale,
            category_id: row.category_id,
            category,
            created_at: row.created_at,
        }
    }
}

impl PostgresRepositories {
    async fn fetch_products(
        &self,
        condition: &str,
        bind: Option<String>,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let sql = format!("{PRODUCT_SELECT} {condition} {PRODUCT_ORDER}");
        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn load_product(&self, id: Uuid) -> Result<ProductRecord, RepoError> {
        self.find_product_by_id(id)
            .await?
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.fetch_products("", None).await
    }

    async fn list_products_by_category(
        &self,
        slug: &str,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        self.fetch_products("WHERE c.slug = $1", Some(slug.to_string()))
            .await
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.slug = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRecord::from))
    }

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<ProductRecord>, RepoError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRecord::from))
    }

    async fn search_products(&self, query: &str) -> Result<Vec<ProductRecord>, RepoError> {
        self.fetch_products("WHERE p.name ILIKE $1", Some(contains_pattern(query)))
            .await
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let fields = params.fields;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO products (name, slug, price, discount_price, description, stock, \
                 fabric, color, style, sizes, images, is_new, is_sale, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id",
        )
        .bind(&fields.name)
        .bind(&fields.slug)
        .bind(fields.price)
        .bind(fields.discount_price)
        .bind(fields.description.as_deref())
        .bind(stock_to_db(fields.stock)?)
        .bind(fields.fabric.as_deref())
        .bind(fields.color.as_deref())
        .bind(fields.style.as_deref())
        .bind(&fields.sizes)
        .bind(&fields.images)
        .bind(fields.is_new)
        .bind(fields.is_sale)
        .bind(fields.category_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.load_product(id).await
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let UpdateProductParams { id, fields } = params;
        let ProductFields {
            name,
            slug,
            price,
            discount_price,
            description,
            stock,
            fabric,
            color,
            style,
            sizes,
            images,
            is_new,
            is_sale,
            category_id,
        } = fields;

        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE products \
             SET name = $2, slug = $3, price = $4, discount_price = $5, description = $6, \
                 stock = $7, fabric = $8, color = $9, style = $10, sizes = $11, images = $12, \
                 is_new = $13, is_sale = $14, category_id = $15 \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(price)
        .bind(discount_price)
        .bind(description)
        .bind(stock_to_db(stock)?)
        .bind(fabric)
        .bind(color)
        .bind(style)
        .bind(sizes)
        .bind(images)
        .bind(is_new)
        .bind(is_sale)
        .bind(category_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let id = updated.ok_or(RepoError::NotFound)?;
        self.load_product(id).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
