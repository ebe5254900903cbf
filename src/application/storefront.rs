//! Page-level view assembly for the storefront.
//!
//! Each page gathers its independent reads concurrently. A failed secondary
//! read degrades its own section to an empty list with an error note and
//! leaves the rest of the page intact.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::application::catalog::CatalogService;
use crate::application::enquiry::{EnquiryError, EnquiryRequest, EnquiryService};
use crate::application::favorites::FavoritesStore;
use crate::application::listing::{self, FacetSelection, Facets};
use crate::application::presentation::{ProductView, present};
use crate::application::repos::RepoError;
use crate::domain::entities::{CategoryRecord, ProductRecord, SettingsRecord};
use crate::domain::types::SortMode;

pub const EMPTY_CATEGORY_MESSAGE: &str = "No products in this category yet";
pub const EMPTY_SEARCH_MESSAGE: &str = "No products found";
pub const EMPTY_FAVORITES_MESSAGE: &str = "You haven't added any favorites yet";
pub const ALL_PRODUCTS_TITLE: &str = "All Products";

const RELATED_LIMIT: usize = 4;
const FEATURED_LIMIT: usize = 4;
const SOURCE: &str = "application::storefront";

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("product `{slug}` not found")]
    ProductNotFound { slug: String },
    #[error(transparent)]
    Enquiry(#[from] EnquiryError),
}

/// A page region backed by its own read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    pub items: Vec<T>,
    /// Set when the read failed; `items` is then empty.
    pub error: Option<String>,
}

impl<T> Section<T> {
    fn ready(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    fn from_result(result: Result<Vec<T>, RepoError>, section: &'static str) -> Self {
        match result {
            Ok(items) => Self::ready(items),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    section,
                    error = %err,
                    result = "degraded",
                    "storefront section failed to load"
                );
                Self {
                    items: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub title: String,
    pub category: Option<CategoryRecord>,
    pub sort: SortMode,
    pub facets: Facets,
    pub products: Vec<ProductView>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub product: ProductView,
    pub record: ProductRecord,
    pub related: Section<ProductView>,
    pub whatsapp_number: String,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub results: Vec<ProductView>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoritesPage {
    pub products: Vec<ProductView>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub announcement: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub categories: Section<CategoryRecord>,
    pub featured: Section<ProductView>,
    pub favorites_count: usize,
}

#[derive(Clone)]
pub struct StorefrontService {
    catalog: CatalogService,
    favorites: Arc<FavoritesStore>,
    enquiry: EnquiryService,
}

impl StorefrontService {
    pub fn new(
        catalog: CatalogService,
        favorites: Arc<FavoritesStore>,
        enquiry: EnquiryService,
    ) -> Self {
        Self {
            catalog,
            favorites,
            enquiry,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn favorites(&self) -> &Arc<FavoritesStore> {
        &self.favorites
    }

    /// Products of one category, or of the whole catalog when `slug` is
    /// `None`. An unresolved slug is titled "All Products".
    pub async fn category_page(
        &self,
        slug: Option<&str>,
        sort: SortMode,
        selection: &FacetSelection,
    ) -> Result<CategoryPage, StorefrontError> {
        let (categories, products) = match slug {
            Some(slug) => tokio::join!(
                self.catalog.list_categories(),
                self.catalog.list_products_by_category(slug)
            ),
            None => tokio::join!(self.catalog.list_categories(), self.catalog.list_products()),
        };

        let category = match (slug, categories) {
            (Some(slug), Ok(categories)) => categories.into_iter().find(|c| c.slug == slug),
            (Some(_), Err(err)) => {
                warn!(
                    target = SOURCE,
                    section = "category_header",
                    error = %err,
                    result = "degraded",
                    "failed to resolve category header"
                );
                None
            }
            (None, _) => None,
        };

        let sorted = listing::apply(products?, sort);
        let facets = listing::derive_facets(&sorted);
        let visible = listing::filter_by_facets(sorted, selection);
        let products: Vec<ProductView> = visible.iter().map(present).collect();

        Ok(CategoryPage {
            title: category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| ALL_PRODUCTS_TITLE.to_string()),
            category,
            sort,
            facets,
            empty_message: products.is_empty().then_some(EMPTY_CATEGORY_MESSAGE),
            products,
        })
    }

    /// `Ok(None)` when no product has this slug.
    pub async fn product_page(&self, slug: &str) -> Result<Option<ProductPage>, StorefrontError> {
        let (record, settings) = tokio::join!(
            self.catalog.find_product_by_slug(slug),
            self.load_settings_best_effort()
        );
        let Some(record) = record? else {
            return Ok(None);
        };

        let related = match record.category_slug() {
            Some(category_slug) => Section::from_result(
                self.catalog
                    .list_products_by_category(category_slug)
                    .await
                    .map(|products| related_products(&record, products)),
                "related_products",
            ),
            None => Section::ready(Vec::new()),
        };

        Ok(Some(ProductPage {
            product: present(&record),
            whatsapp_number: self.enquiry.resolve_number(settings.as_ref()),
            is_favorite: self.favorites.is_favorite(&record.id.to_string()),
            related,
            record,
        }))
    }

    pub async fn search_page(&self, query: &str) -> Result<SearchPage, StorefrontError> {
        let results: Vec<ProductView> = self
            .catalog
            .search_products(query)
            .await?
            .iter()
            .map(present)
            .collect();

        Ok(SearchPage {
            query: query.trim().to_string(),
            empty_message: results.is_empty().then_some(EMPTY_SEARCH_MESSAGE),
            results,
        })
    }

    /// Favorited products in catalog order.
    pub async fn favorites_page(&self) -> Result<FavoritesPage, StorefrontError> {
        if self.favorites.count() == 0 {
            return Ok(FavoritesPage {
                products: Vec::new(),
                empty_message: Some(EMPTY_FAVORITES_MESSAGE),
            });
        }

        let snapshot = self.favorites.snapshot();
        let products: Vec<ProductView> = self
            .catalog
            .list_products()
            .await?
            .iter()
            .filter(|product| snapshot.contains(&product.id.to_string()))
            .map(present)
            .collect();

        Ok(FavoritesPage {
            empty_message: products.is_empty().then_some(EMPTY_FAVORITES_MESSAGE),
            products,
        })
    }

    /// Landing page; never fails as a whole.
    pub async fn home_page(&self) -> HomePage {
        let (categories, products, settings) = tokio::join!(
            self.catalog.list_categories(),
            self.catalog.list_products(),
            self.load_settings_best_effort()
        );

        let featured = products.map(|products| {
            products
                .iter()
                .take(FEATURED_LIMIT)
                .map(present)
                .collect::<Vec<_>>()
        });

        HomePage {
            announcement: settings
                .as_ref()
                .and_then(SettingsRecord::announcement)
                .map(str::to_string),
            hero_title: settings.as_ref().and_then(|s| s.hero_title.clone()),
            hero_subtitle: settings.as_ref().and_then(|s| s.hero_subtitle.clone()),
            categories: Section::from_result(categories, "categories"),
            featured: Section::from_result(featured, "featured_products"),
            favorites_count: self.favorites.count(),
        }
    }

    /// Build the WhatsApp enquiry link for a product.
    pub async fn enquire(
        &self,
        slug: &str,
        selected_size: Option<&str>,
        page_url: &str,
    ) -> Result<Url, StorefrontError> {
        let (record, settings) = tokio::join!(
            self.catalog.find_product_by_slug(slug),
            self.load_settings_best_effort()
        );
        let record = record?.ok_or_else(|| StorefrontError::ProductNotFound {
            slug: slug.to_string(),
        })?;

        let request = EnquiryRequest {
            product: &record,
            selected_size,
            page_url,
        };
        Ok(self.enquiry.build_link(&request, settings.as_ref())?)
    }

    async fn load_settings_best_effort(&self) -> Option<SettingsRecord> {
        match self.catalog.load_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    section = "settings",
                    error = %err,
                    result = "defaults",
                    "failed to load storefront settings"
                );
                None
            }
        }
    }
}

fn related_products(product: &ProductRecord, candidates: Vec<ProductRecord>) -> Vec<ProductView> {
    candidates
        .iter()
        .filter(|candidate| candidate.id != product.id)
        .take(RELATED_LIMIT)
        .map(present)
        .collect()
}
