//! Client-side ordering and facet extraction for product listings.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::entities::ProductRecord;
use crate::domain::types::SortMode;

/// Distinct filter values present in a listing, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub fabrics: Vec<String>,
    pub colors: Vec<String>,
}

/// Facet values a shopper has selected.
///
/// Within one facet any selected value matches; across facets every
/// non-empty selection must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    pub fabrics: Vec<String>,
    pub colors: Vec<String>,
}

impl FacetSelection {
    pub fn is_empty(&self) -> bool {
        self.fabrics.is_empty() && self.colors.is_empty()
    }
}

/// Order `products` for display.
///
/// `Newest` keeps the repository order. Price modes sort on effective price
/// with a stable sort, so equally priced products keep their relative order.
pub fn apply(mut products: Vec<ProductRecord>, sort: SortMode) -> Vec<ProductRecord> {
    match sort {
        SortMode::Newest => {}
        SortMode::PriceAsc => products.sort_by_key(ProductRecord::effective_price),
        SortMode::PriceDesc => {
            products.sort_by(|a, b| b.effective_price().cmp(&a.effective_price()))
        }
    }
    products
}

/// Collect distinct fabrics and colors from exactly the products given.
pub fn derive_facets(products: &[ProductRecord]) -> Facets {
    Facets {
        fabrics: distinct(products.iter().map(|p| p.fabric.as_deref())),
        colors: distinct(products.iter().map(|p| p.color.as_deref())),
    }
}

pub fn filter_by_facets(
    products: Vec<ProductRecord>,
    selection: &FacetSelection,
) -> Vec<ProductRecord> {
    if selection.is_empty() {
        return products;
    }

    products
        .into_iter()
        .filter(|product| {
            matches_facet(&selection.fabrics, product.fabric.as_deref())
                && matches_facet(&selection.colors, product.color.as_deref())
        })
        .collect()
}

fn matches_facet(selected: &[String], value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|value| selected.iter().any(|s| s.trim() == value.trim()))
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .flatten()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
