//! In-memory output cache for rendered front-end responses.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::application::surface::OutputCache;

use super::{
    config::CacheConfig,
    lock::{rw_read, rw_write},
};

pub(crate) const HIT_TOTAL: &str = "veneer_output_cache_hit_total";
pub(crate) const MISS_TOTAL: &str = "veneer_output_cache_miss_total";
pub(crate) const PURGE_TOTAL: &str = "veneer_output_cache_purge_total";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputKey {
    pub path: String,
    pub query_hash: u64,
}

impl OutputKey {
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query_hash: hash_query(query),
        }
    }
}

/// Hash a raw query string; the empty query hashes to 0.
pub fn hash_query(query: &str) -> u64 {
    if query.is_empty() {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

pub struct OutputCacheStore {
    responses: RwLock<LruCache<OutputKey, CachedResponse>>,
    /// Bumped by every purge, while the responses lock is held.
    generation: AtomicU64,
}

impl OutputCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(config.response_limit_non_zero())),
            generation: AtomicU64::new(0),
        }
    }

    /// Purge generation; compare with [`Self::set_if_generation`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn get(&self, key: &OutputKey) -> Option<CachedResponse> {
        let cached = rw_write(&self.responses, "get").get(key).cloned();
        match cached {
            Some(_) => counter!(HIT_TOTAL).increment(1),
            None => counter!(MISS_TOTAL).increment(1),
        }
        cached
    }

    /// Store a response, returning the key evicted to make room, if any.
    pub fn set(&self, key: OutputKey, response: CachedResponse) -> Option<OutputKey> {
        rw_write(&self.responses, "set")
            .push(key.clone(), response)
            .map(|(evicted, _)| evicted)
            .filter(|evicted| *evicted != key)
    }

    /// Store a response rendered before the cache was at `generation`.
    ///
    /// Returns `false` without storing when a purge happened in between.
    pub fn set_if_generation(
        &self,
        generation: u64,
        key: OutputKey,
        response: CachedResponse,
    ) -> bool {
        let mut responses = rw_write(&self.responses, "set_if_generation");
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        responses.push(key, response);
        true
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputCache for OutputCacheStore {
    fn remove_all_items(&self) {
        let mut responses = rw_write(&self.responses, "remove_all_items");
        let removed = responses.len();
        responses.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        drop(responses);

        counter!(PURGE_TOTAL).increment(1);
        debug!(target: "veneer::cache", removed, "output cache purged");
    }
}
