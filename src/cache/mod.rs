//! Output cache for rendered front-end pages.
//!
//! Whole responses are cached per path and query. Entries are never
//! invalidated individually: a failing surface request purges everything
//! through [`OutputCache::remove_all_items`](crate::application::surface::OutputCache).
//!
//! ```toml
//! [cache]
//! enabled = true
//! response_limit = 200
//! body_limit_bytes = 1048576
//! ```

mod config;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use middleware::{CacheState, output_cache_layer};
pub use store::{CachedResponse, OutputCacheStore, OutputKey, hash_query};

pub(crate) use store::{HIT_TOTAL, MISS_TOTAL, PURGE_TOTAL};
