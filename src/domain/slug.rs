//! Utilities for generating URL-safe catalog slugs.
//!
//! Slugification is delegated to the `slug` crate, which transliterates
//! non-ASCII input. Callers supply an async uniqueness predicate so the
//! derivation itself stays free of persistence concerns.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 50;

/// Why a name could not be turned into a usable slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("cannot derive a slug from blank text")]
    EmptyInput,
    #[error("`{input}` has no characters usable in a slug")]
    Unrepresentable { input: String },
    #[error("no free slug left for `{base}`")]
    Exhausted { base: String },
}

/// Slug derivation failure, or an error from the uniqueness lookup.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from a product or category name.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug the `is_unique` predicate accepts, retrying with a counter
/// suffix (`-2`, `-3`, …).
///
/// `is_unique` resolves to `true` when no record currently owns the slug.
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}
