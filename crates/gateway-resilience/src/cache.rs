//! In-memory response cache with TTL and insertion-order eviction.
//!
//! Expiry is evaluated lazily on read; there is no background sweep and no
//! per-entry timer. When the cache is full the entry with the oldest
//! insertion time is evicted, regardless of how recently it was read.
//!
//! The TTL is applied at read time against each entry's original insertion
//! instant, so changing it through [`ResponseCache::reconfigure`] shortens or
//! extends the remaining lifetime of entries already stored.

use gateway_core::ApodError;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry lifetime
    pub ttl: Duration,
    /// Maximum number of entries, at least 1
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 100,
        }
    }
}

/// Runtime reconfiguration request.
///
/// Values are signed so out-of-range input can be reported instead of
/// failing to parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheReconfigure {
    /// New TTL in milliseconds, must be `>= 0`
    pub ttl_ms: Option<i64>,
    /// New capacity, must be `>= 1`
    pub max_entries: Option<i64>,
}

/// Effective cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheSettings {
    /// TTL in milliseconds
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
    /// Capacity
    #[serde(rename = "maxSize")]
    pub max_entries: usize,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Entries currently stored (expired entries not yet read included)
    pub size: usize,
    /// Capacity
    #[serde(rename = "maxSize")]
    pub max_entries: usize,
    /// TTL in milliseconds
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// `hits / (hits + misses)` as a percentage, 0 without lookups
    pub hit_rate: f64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion sequence -> key, oldest first
    order: BTreeMap<u64, String>,
    next_seq: u64,
    ttl: Duration,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl<V> CacheInner<V> {
    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.remove(&entry.seq);
                true
            }
            None => false,
        }
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            self.entries.remove(&key);
            debug!(key = %key, "Cache full, evicted oldest entry");
        }
    }

    fn shrink_to_capacity(&mut self) {
        while self.entries.len() > self.max_entries {
            self.evict_oldest();
        }
    }
}

/// Thread-safe response cache
pub struct ResponseCache<V> {
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        debug!(
            ttl_ms = config.ttl.as_millis() as u64,
            max_entries = config.max_entries,
            "Cache initialized"
        );
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_seq: 0,
                ttl: config.ttl,
                max_entries: config.max_entries.max(1),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up `key`, recording a hit or a miss.
    ///
    /// An expired entry is removed and counted as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let fresh = inner
            .entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.inserted_at) < inner.ttl);

        match fresh {
            Some(true) => {
                inner.hits += 1;
                inner.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                inner.remove(key);
                inner.misses += 1;
                debug!(key = %key, "Cache entry expired");
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or replace `key`.
    ///
    /// Inserting a new key into a full cache evicts the oldest insertion
    /// first. Replacing a key refreshes its insertion time.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if !inner.remove(&key) {
            while inner.entries.len() >= inner.max_entries {
                inner.evict_oldest();
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, key.clone());
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );

        debug!(
            key = %key,
            size = inner.entries.len(),
            max_entries = inner.max_entries,
            "Cache set"
        );
    }

    /// Remove `key`, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key)
    }

    /// Drop every entry and reset hit/miss counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.hits = 0;
        inner.misses = 0;
        debug!("Cache cleared");
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current settings
    pub fn settings(&self) -> CacheSettings {
        let inner = self.inner.lock();
        CacheSettings {
            ttl_ms: inner.ttl.as_millis() as u64,
            max_entries: inner.max_entries,
        }
    }

    /// Statistics snapshot
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            (inner.hits as f64 / total as f64) * 100.0
        };

        CacheStats {
            size: inner.entries.len(),
            max_entries: inner.max_entries,
            ttl_ms: inner.ttl.as_millis() as u64,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        }
    }

    /// Change TTL and/or capacity.
    ///
    /// Both values are validated before either is applied. Lowering the
    /// capacity below the current size evicts the oldest entries at once.
    pub fn reconfigure(&self, update: CacheReconfigure) -> Result<CacheSettings, ApodError> {
        let ttl = update
            .ttl_ms
            .map(|ms| {
                u64::try_from(ms)
                    .map(Duration::from_millis)
                    .map_err(|_| ApodError::config_validation("ttl", "TTL must be a positive number"))
            })
            .transpose()?;

        let max_entries = update
            .max_entries
            .map(|n| match usize::try_from(n) {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(ApodError::config_validation(
                    "maxSize",
                    "Max size must be at least 1",
                )),
            })
            .transpose()?;

        let mut inner = self.inner.lock();
        if let Some(ttl) = ttl {
            inner.ttl = ttl;
            debug!(ttl_ms = ttl.as_millis() as u64, "Cache TTL updated");
        }
        if let Some(max_entries) = max_entries {
            inner.max_entries = max_entries;
            inner.shrink_to_capacity();
            debug!(max_entries = max_entries, "Cache max size updated");
        }

        Ok(CacheSettings {
            ttl_ms: inner.ttl.as_millis() as u64,
            max_entries: inner.max_entries,
        })
    }
}
