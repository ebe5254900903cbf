use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown sort mode `{value}` (expected newest, price-asc or price-desc)")]
    UnknownSortMode { value: String },
    #[error("stock quantity `{value}` is not a whole number")]
    InvalidStock { value: String },
}
