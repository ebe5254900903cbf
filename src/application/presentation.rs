//! Display-ready projection of catalog products.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::ProductRecord;
use crate::domain::pricing;
use crate::domain::types::StockLevel;

pub const PLACEHOLDER_IMAGE: &str = "/fallback-image.jpg";
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Everything a product card or detail view needs, computed once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub effective_price: Decimal,
    pub has_discount: bool,
    pub discount_percent: u32,
    pub primary_image: String,
    pub stock_level: StockLevel,
    pub stock_label: &'static str,
    pub category_label: String,
    pub is_new: bool,
    pub is_sale: bool,
}

impl ProductView {
    pub fn price_text(&self) -> String {
        format_price(self.effective_price)
    }

    /// Struck-through list price, shown only alongside a discount.
    pub fn original_price_text(&self) -> Option<String> {
        self.has_discount.then(|| format_price(self.price))
    }
}

/// Project a product for display without touching the stored record.
pub fn present(product: &ProductRecord) -> ProductView {
    let stock_level = product.stock_level();

    ProductView {
        id: product.id,
        name: product.name.clone(),
        slug: product.slug.clone(),
        price: product.price,
        effective_price: product.effective_price(),
        has_discount: product.has_discount(),
        discount_percent: pricing::discount_percent(product.price, product.discount_price),
        primary_image: product
            .images
            .first()
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        stock_level,
        stock_label: stock_level.label(),
        category_label: product
            .category
            .as_ref()
            .map(|category| category.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string()),
        is_new: product.is_new,
        is_sale: product.is_sale,
    }
}

/// Format an amount in rupees with Indian digit grouping, e.g. `₹1,25,000`.
///
/// Paise are rounded to the nearest rupee for display only.
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().trunc().to_string();
    format!("{sign}₹{}", group_en_in(&digits))
}

fn group_en_in(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}
