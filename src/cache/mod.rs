//! Catalog query cache.
//!
//! Read results are cached under an explicit [`QueryKey`] naming the
//! operation and its parameters. Entries never expire on their own; callers
//! invalidate by key, by [`QueryFamily`], or wholesale after writes.
//!
//! ```toml
//! [cache]
//! enable_query_cache = true
//! query_limit = 256
//! ```

mod config;
mod generation;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use generation::{RequestGenerations, RequestTicket};
pub use keys::{QueryFamily, QueryKey};
pub use store::{CachedQuery, Cacheable, QueryCache};

pub(crate) use lock::{rw_read, rw_write};
