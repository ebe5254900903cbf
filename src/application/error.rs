use thiserror::Error;

use crate::{
    application::{
        admin::{
            categories::AdminCategoryError, images::AdminImageError, products::AdminProductError,
            session::AdminSessionError, settings::AdminSettingsError,
        },
        enquiry::EnquiryError,
        repos::RepoError,
        storefront::StorefrontError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("{entity} `{key}` not found")]
    NotFound { entity: &'static str, key: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit status reported by the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound { .. } => 3,
            AppError::Validation(_) | AppError::Domain(_) => 2,
            AppError::Repo(_) | AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }

    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } | AppError::Repo(RepoError::NotFound) => "Not found",
            AppError::Domain(_) | AppError::Validation(_) => "Request could not be processed",
            AppError::Repo(RepoError::Timeout) => "Catalog timed out, please try again",
            AppError::Repo(_) | AppError::Infra(InfraError::Database { .. }) => {
                "Catalog temporarily unavailable"
            }
            AppError::Infra(InfraError::Http { .. }) => "Backend temporarily unavailable",
            AppError::Infra(InfraError::Configuration { .. }) => "Storefront misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure",
            AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }
}

impl From<StorefrontError> for AppError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Repo(err) => Self::Repo(err),
            StorefrontError::ProductNotFound { slug } => Self::not_found("product", slug),
            StorefrontError::Enquiry(err) => Self::from(err),
        }
    }
}

impl From<EnquiryError> for AppError {
    fn from(err: EnquiryError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AdminCategoryError> for AppError {
    fn from(err: AdminCategoryError) -> Self {
        match err {
            AdminCategoryError::Validation(message) => Self::validation(message),
            AdminCategoryError::NotFound => Self::not_found("category", "by id"),
            AdminCategoryError::Repo(err) => Self::Repo(err),
        }
    }
}

impl From<AdminProductError> for AppError {
    fn from(err: AdminProductError) -> Self {
        match err {
            AdminProductError::Validation(message) => Self::validation(message),
            AdminProductError::NotFound => Self::not_found("product", "by id"),
            AdminProductError::Repo(err) => Self::Repo(err),
        }
    }
}

impl From<AdminSettingsError> for AppError {
    fn from(err: AdminSettingsError) -> Self {
        match err {
            AdminSettingsError::Validation(message) => Self::validation(message),
            AdminSettingsError::Missing => Self::not_found("settings", "storefront"),
            AdminSettingsError::Repo(err) => Self::Repo(err),
        }
    }
}

impl From<AdminImageError> for AppError {
    fn from(err: AdminImageError) -> Self {
        match err {
            AdminImageError::Validation(message) => Self::validation(message),
            AdminImageError::Store(err) => Self::Infra(InfraError::http(err.to_string())),
        }
    }
}

impl From<AdminSessionError> for AppError {
    fn from(err: AdminSessionError) -> Self {
        match err {
            AdminSessionError::Validation(message) => Self::validation(message),
            AdminSessionError::Unauthenticated => Self::validation("sign in required"),
            AdminSessionError::Auth(err) => Self::Infra(InfraError::http(err.to_string())),
        }
    }
}
