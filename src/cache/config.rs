//! Cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_QUERY_LIMIT: usize = 256;

/// Query cache configuration from the `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve repeated catalog reads from memory.
    pub enable_query_cache: bool,
    /// Maximum cached query results before LRU eviction.
    pub query_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_query_cache: true,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_query_cache: settings.enable_query_cache,
            query_limit: settings.query_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the query limit as NonZeroUsize, clamping to 1 if zero.
    pub fn query_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
