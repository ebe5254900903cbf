use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::admin::{SlugFailure, normalize_optional, resolve_slug};
use crate::application::catalog::CatalogService;
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, RepoError, UpdateCategoryParams,
};
use crate::cache::QueryFamily;
use crate::domain::entities::CategoryRecord;

#[derive(Debug, Error)]
pub enum AdminCategoryError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("category not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugFailure> for AdminCategoryError {
    fn from(failure: SlugFailure) -> Self {
        match failure {
            SlugFailure::Unrepresentable => {
                Self::Validation("Category slug must contain letters or digits")
            }
            SlugFailure::Exhausted => Self::Validation("Category slug is already taken"),
            SlugFailure::Repo(err) => Self::Repo(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateCategoryCommand {
    pub name: String,
    /// Derived from `name` when absent or blank.
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Public URL of an already uploaded image.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryCommand {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Replaces the stored image when set; `None` keeps it.
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct AdminCategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    catalog: CatalogService,
}

impl AdminCategoryService {
    pub fn new(
        reader: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn CategoriesWriteRepo>,
        catalog: CatalogService,
    ) -> Self {
        Self {
            reader,
            writer,
            catalog,
        }
    }

    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, AdminCategoryError> {
        let name = required_name(&command.name)?;
        let slug = self.unique_slug(command.slug.as_deref(), &name, None).await?;

        let params = CreateCategoryParams {
            name,
            slug,
            description: normalize_optional(command.description),
            image: normalize_optional(command.image),
        };

        let category = self.writer.create_category(params).await?;
        self.invalidate();
        info!(
            target = "application::admin::categories",
            category_id = %category.id,
            slug = %category.slug,
            "category created"
        );
        Ok(category)
    }

    pub async fn update_category(
        &self,
        command: UpdateCategoryCommand,
    ) -> Result<CategoryRecord, AdminCategoryError> {
        let name = required_name(&command.name)?;

        let existing = self
            .reader
            .find_category_by_id(command.id)
            .await?
            .ok_or(AdminCategoryError::NotFound)?;

        let slug = self
            .unique_slug(command.slug.as_deref(), &name, Some(existing.id))
            .await?;

        let params = UpdateCategoryParams {
            id: existing.id,
            name,
            slug,
            description: normalize_optional(command.description),
            image: normalize_optional(command.image).or(existing.image),
        };

        let category = self.writer.update_category(params).await?;
        self.invalidate();
        Ok(category)
    }

    /// Products of a deleted category become uncategorized.
    pub async fn delete_category(&self, id: Uuid) -> Result<(), AdminCategoryError> {
        self.writer.delete_category(id).await.map_err(|err| match err {
            RepoError::NotFound => AdminCategoryError::NotFound,
            other => AdminCategoryError::Repo(other),
        })?;
        self.invalidate();
        Ok(())
    }

    async fn unique_slug(
        &self,
        explicit: Option<&str>,
        name: &str,
        owner: Option<Uuid>,
    ) -> Result<String, AdminCategoryError> {
        let reader = self.reader.clone();
        let slug = resolve_slug(explicit, name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_category_by_slug(&candidate)
                    .await
                    .map(|found| found.is_none_or(|category| Some(category.id) == owner))
            }
        })
        .await?;
        Ok(slug)
    }

    fn invalidate(&self) {
        // Product listings embed the category, so both families go stale.
        self.catalog.invalidate_family(QueryFamily::Categories);
        self.catalog.invalidate_family(QueryFamily::Products);
    }
}

fn required_name(name: &str) -> Result<String, AdminCategoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AdminCategoryError::Validation("Category name is required"));
    }
    Ok(trimmed.to_string())
}
