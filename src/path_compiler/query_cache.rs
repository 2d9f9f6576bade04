//! Cache of compiled route queries
//!
//! Compiling a route walks the route table and builds a fresh AST. Routes that
//! differ only in their parameter segments produce the same statement text, so
//! the compiled result is kept and only the parameter values are rebound.
//!
//! # Architecture
//!
//! Cache Key: the resolved route, literal segments escaped and parameter
//! segments replaced by a capturing group, e.g. `model/([a-zA-Z0-9_]+)/nodes`
//! Cache Value: the compiled statement plus its route-parameter bindings
//!
//! # Configuration
//!
//! Part of [`CompilerConfig`](crate::config::CompilerConfig), which reads
//! `PATHCYPHER_QUERY_CACHE_ENABLED` and `PATHCYPHER_QUERY_CACHE_MAX_ENTRIES`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::engine::Compiled;

#[derive(Debug)]
struct CacheEntry {
    /// `^key$`, used to pull parameter values out of a request path
    pattern: Regex,
    compiled: Arc<Compiled>,
    /// Logical clock value of the last access (for LRU)
    last_accessed: u64,
    access_count: u64,
}

/// Configuration for the query cache
#[derive(Debug, Clone, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCacheConfig {
    /// Enable or disable caching
    pub enabled: bool,

    /// Maximum number of entries (LRU eviction)
    #[validate(range(min = 1, message = "Query cache needs room for at least one entry"))]
    pub max_entries: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        QueryCacheConfig {
            enabled: true,
            max_entries: 1000,
        }
    }
}

/// A cached compile together with the parameter values captured from the
/// request path, in path order.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub compiled: Arc<Compiled>,
    pub captures: Vec<String>,
}

/// Route query cache with LRU eviction
#[derive(Debug)]
pub struct QueryCache {
    cache: Mutex<HashMap<String, CacheEntry>>,
    config: QueryCacheConfig,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl QueryCache {
    pub fn new(config: QueryCacheConfig) -> Self {
        QueryCache {
            cache: Mutex::new(HashMap::new()),
            config,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(QueryCacheConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up the entry stored under `key` and capture the parameter values
    /// of `path` with it.
    ///
    /// Returns None if nothing is cached under `key`, or if `path` has a
    /// parameter segment the key's pattern cannot capture.
    pub fn get(&self, key: &str, path: &str) -> Option<CacheHit> {
        if !self.config.enabled {
            return None;
        }

        let mut cache = self.lock();
        let hit = cache.get_mut(key).and_then(|entry| {
            let captures = entry.pattern.captures(path)?;
            entry.last_accessed = self.tick();
            entry.access_count += 1;
            Some(CacheHit {
                compiled: Arc::clone(&entry.compiled),
                captures: captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
        });

        match &hit {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("query cache hit for '{}'", key);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("query cache miss for '{}'", key);
            }
        }
        hit
    }

    /// Store a compile under its key
    ///
    /// May trigger LRU eviction if cache is full
    pub fn insert(&self, compiled: Arc<Compiled>) {
        if !self.config.enabled {
            return;
        }

        let pattern = match Regex::new(&format!("^{}$", compiled.key)) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::warn!("not caching route '{}': {}", compiled.key, e);
                return;
            }
        };
        let entry = CacheEntry {
            pattern,
            compiled: Arc::clone(&compiled),
            last_accessed: self.tick(),
            access_count: 0,
        };

        let mut cache = self.lock();
        if !cache.contains_key(&compiled.key) && cache.len() >= self.config.max_entries {
            self.evict_lru(&mut cache);
        }
        cache.insert(compiled.key.clone(), entry);
    }

    /// Evict least recently used entry
    fn evict_lru(&self, cache: &mut HashMap<String, CacheEntry>) {
        if let Some(key) = cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
        {
            cache.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("query cache evicted '{}'", key);
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        let cache = self.lock();
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: cache.len(),
            max_entries: self.config.max_entries,
            total_accesses: cache.values().map(|e| e.access_count).sum(),
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_entries: usize,
    /// Hits served by the entries currently cached
    pub total_accesses: u64,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate entry utilization (0.0 to 1.0)
    pub fn entry_utilization(&self) -> f64 {
        if self.max_entries == 0 {
            0.0
        } else {
            self.size as f64 / self.max_entries as f64
        }
    }
}
