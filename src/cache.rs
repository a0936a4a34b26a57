//! In-memory TTL cache for catalog data.
//!
//! Stores one [`CachedValue`] per string key with a creation and expiry
//! timestamp. Expired entries are evicted lazily on read; there is no
//! background sweep. Staleness is a separate, shorter threshold than expiry:
//! a stale-but-unexpired entry is still served but signals the updater to
//! refresh in the background.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use regex::Regex;
use tokio::time::Instant;

use crate::error::Result;
use crate::types::{Episode, MediaItem};

/// Default TTL for episode lists and anything without a dedicated class.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
/// TTL for the trending list.
pub const TRENDING_TTL: Duration = Duration::from_secs(10 * 60);
/// TTL for series details.
pub const DETAILS_TTL: Duration = Duration::from_secs(30 * 60);
/// Default staleness window, shorter than every TTL.
pub const DEFAULT_STALE_WINDOW: Duration = Duration::from_secs(2 * 60);

/// Category of cached data, each with its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Trending list (10 minute TTL).
    Trending,
    /// Series details (30 minute TTL).
    Details,
    /// Episode lists (5 minute TTL).
    Episodes,
    /// Anything else (5 minute TTL).
    Default,
}

/// A value stored in the cache.
///
/// Callers receive these behind an `Arc` and must treat them as read-only
/// snapshots; an update replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// The trending list.
    Trending(Vec<MediaItem>),
    /// Details for one series.
    Details(MediaItem),
    /// Episode list for one series.
    Episodes(Vec<Episode>),
}

/// Entry in the cache. Immutable once created.
struct CacheEntry {
    value: Arc<CachedValue>,
    created_at: Instant,
    expires_at: Instant,
}

/// Configured TTLs and staleness window for a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub trending: Duration,
    pub details: Duration,
    pub episodes: Duration,
    pub default: Duration,
    pub stale_window: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            trending: TRENDING_TTL,
            details: DETAILS_TTL,
            episodes: DEFAULT_TTL,
            default: DEFAULT_TTL,
            stale_window: DEFAULT_STALE_WINDOW,
        }
    }
}

/// Thread-safe TTL cache for catalog data.
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
    ttls: CacheTtls,
}

impl CacheStore {
    /// Create a cache with the given TTL table.
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            entries: DashMap::new(),
            ttls,
        }
    }

    /// Store `value` under `key`, replacing any existing entry.
    ///
    /// The entry expires `ttl` from now, falling back to the default TTL when
    /// `ttl` is `None`. A zero TTL is accepted and means the entry is already
    /// expired for any subsequent `get`.
    pub fn set(&self, key: &str, value: CachedValue, ttl: Option<Duration>) {
        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.ttls.default);

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::new(value),
                created_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Fetch the value under `key`, or `None` if absent or expired.
    ///
    /// Side-effecting read: an expired entry is removed before `None` is
    /// returned.
    pub fn get(&self, key: &str) -> Option<Arc<CachedValue>> {
        let expired = match self.entries.get(key) {
            Some(entry) => Instant::now() >= entry.expires_at,
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(key = %key, "Evicted expired cache entry");
            return None;
        }

        self.entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Whether `key` should be proactively refreshed.
    ///
    /// True when the key is absent or its entry is older than `window`
    /// (default two minutes). Distinct from expiry: a stale-but-unexpired
    /// entry is still returned by [`get`](Self::get). Never evicts.
    pub fn is_stale(&self, key: &str, window: Option<Duration>) -> bool {
        let window = window.unwrap_or(self.ttls.stale_window);
        match self.entries.get(key) {
            Some(entry) => entry.created_at.elapsed() > window,
            None => true,
        }
    }

    /// Remove entries whose key matches `pattern`, or every entry when
    /// `pattern` is `None`. Returns the number of entries removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> Result<usize> {
        let Some(pattern) = pattern else {
            let count = self.entries.len();
            self.entries.clear();
            tracing::debug!(removed = count, "Cleared cache");
            return Ok(count);
        };

        let regex = Regex::new(pattern)?;
        let before = self.entries.len();
        self.entries.retain(|key, _| !regex.is_match(key));
        let removed = before - self.entries.len();
        tracing::debug!(pattern = %pattern, removed = removed, "Invalidated cache entries");
        Ok(removed)
    }

    /// TTL for a resource class. Pure lookup.
    pub fn ttl_for(&self, class: ResourceClass) -> Duration {
        match class {
            ResourceClass::Trending => self.ttls.trending,
            ResourceClass::Details => self.ttls.details,
            ResourceClass::Episodes => self.ttls.episodes,
            ResourceClass::Default => self.ttls.default,
        }
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}
