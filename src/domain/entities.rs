use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::pricing;
use super::types::StockLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A catalog product together with its resolved category, if any.
///
/// `stock` is already normalized to a non-negative quantity by the repository
/// that produced the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Uuid,
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
    pub category_id: Option<Uuid>,
    pub category: Option<CategoryRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ProductRecord {
    pub fn effective_price(&self) -> Decimal {
        pricing::effective_price(self.price, self.discount_price)
    }

    pub fn has_discount(&self) -> bool {
        pricing::has_discount(self.price, self.discount_price)
    }

    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_quantity(self.stock)
    }

    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.slug.as_str())
    }

    /// Whether the product must be enquired about with an explicit size.
    pub fn requires_size(&self) -> bool {
        !self.sizes.is_empty()
    }
}

/// Storefront-wide settings; the backing table holds a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub id: Uuid,
    pub whatsapp_number: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub announcement_text: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SettingsRecord {
    /// Announcement text worth showing, or `None` when unset or blank.
    pub fn announcement(&self) -> Option<&str> {
        self.announcement_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
