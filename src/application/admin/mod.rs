//! Application services for catalog administration.
//!
//! Every write arrives as a typed command and is validated before anything
//! reaches the backend. Successful writes invalidate the cached catalog reads
//! they affect.

pub mod categories;
pub mod images;
pub mod products;
pub mod session;
pub mod settings;

use std::future::Future;

use crate::application::repos::RepoError;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

/// Why a slug could not be produced for a record.
#[derive(Debug)]
pub(crate) enum SlugFailure {
    /// Neither the explicit slug nor the name yields any slug characters.
    Unrepresentable,
    Exhausted,
    Repo(RepoError),
}

/// Pick a unique slug, preferring an explicit one over the record name.
///
/// `is_available` receives each candidate and reports whether it may be used.
pub(crate) async fn resolve_slug<F, Fut>(
    explicit: Option<&str>,
    name: &str,
    is_available: F,
) -> Result<String, SlugFailure>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, RepoError>>,
{
    let source = explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(name);

    match generate_unique_slug_async(source, is_available).await {
        Ok(slug) => Ok(slug),
        Err(SlugAsyncError::Slug(SlugError::Exhausted { .. })) => Err(SlugFailure::Exhausted),
        Err(SlugAsyncError::Slug(_)) => Err(SlugFailure::Unrepresentable),
        Err(SlugAsyncError::Predicate(err)) => Err(SlugFailure::Repo(err)),
    }
}

/// Trim an optional text field, treating blank input as absent.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Split comma-separated size input (`"S, M ,L"`) into trimmed entries.
pub fn parse_sizes(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|size| !size.is_empty())
        .map(str::to_string)
        .collect()
}
