//! Shared domain enumerations for catalog listings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Ordering applied to a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Repository order (most recently created first).
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::PriceAsc => "price-asc",
            SortMode::PriceDesc => "price-desc",
        }
    }

    /// Parse a sort mode, falling back to [`SortMode::Newest`] for unknown input.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for SortMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "newest" => Ok(SortMode::Newest),
            "price-asc" => Ok(SortMode::PriceAsc),
            "price-desc" => Ok(SortMode::PriceDesc),
            other => Err(DomainError::UnknownSortMode {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const LIMITED_STOCK_THRESHOLD: u32 = 5;

/// Availability bucket derived from a stock quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Limited,
    InStock,
}

impl StockLevel {
    pub fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => StockLevel::OutOfStock,
            1..=LIMITED_STOCK_THRESHOLD => StockLevel::Limited,
            _ => StockLevel::InStock,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockLevel::OutOfStock => "Out of Stock",
            StockLevel::Limited => "Limited Stock",
            StockLevel::InStock => "In Stock",
        }
    }
}

/// Clamp a stored stock value to a non-negative quantity.
pub fn normalize_stock(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

/// Parse a stock quantity entered as text; blank input means zero.
pub fn parse_stock(input: &str) -> Result<u32, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    trimmed
        .parse::<u32>()
        .map_err(|_| DomainError::InvalidStock {
            value: trimmed.to_string(),
        })
}
