use crate::record::{Coordinates, QueryKey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cache entry storing the outcome of one geocoding lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Resolved position, None if the provider found no match
    pub coordinates: Option<Coordinates>,
    /// Unix timestamp when the entry was stored
    pub cached_at: i64,
}

impl CacheEntry {
    fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        now.saturating_sub(self.cached_at) < ttl
    }
}

/// Geocoding results keyed by (city, state).
///
/// Lives in memory for the duration of a run; when created with
/// [`GeocodeCache::load`] it is also persisted to a JSON file so later runs
/// on the same input issue no requests. Entries older than the TTL are
/// treated as missing.
#[derive(Debug, Clone)]
pub struct GeocodeCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    cache_path: Option<PathBuf>,
}

impl GeocodeCache {
    /// Create an in-memory cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            cache_path: None,
        }
    }

    /// Load cache from disk, or start empty if the file doesn't exist yet
    pub fn load(cache_path: PathBuf, ttl: Duration) -> Result<Self> {
        let entries = if cache_path.exists() {
            let data = fs::read_to_string(&cache_path)
                .with_context(|| format!("Failed to read {}", cache_path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", cache_path.display()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            entries,
            ttl,
            cache_path: Some(cache_path),
        })
    }

    /// Like [`GeocodeCache::load`], but a missing or unreadable file yields an
    /// empty cache that will still be saved to `cache_path`
    pub fn load_or_empty(cache_path: PathBuf, ttl: Duration) -> Self {
        match Self::load(cache_path.clone(), ttl) {
            Ok(cache) => {
                log::debug!(
                    "Loaded {} geocode cache entries from {}",
                    cache.len(),
                    cache_path.display()
                );
                cache
            }
            Err(e) => {
                log::warn!("Ignoring geocode cache: {:#}", e);
                Self {
                    entries: HashMap::new(),
                    ttl,
                    cache_path: Some(cache_path),
                }
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Save cache to disk; a no-op for in-memory caches
    pub fn save(&self) -> Result<()> {
        let Some(cache_path) = &self.cache_path else {
            return Ok(());
        };

        // Create parent directory if needed
        if let Some(parent) = cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let data = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize geocode cache")?;
        fs::write(cache_path, data)
            .with_context(|| format!("Failed to write {}", cache_path.display()))?;
        Ok(())
    }

    /// Cached outcome for `key`: `Some(None)` is a cached "no match"
    pub fn get(&self, key: &QueryKey) -> Option<Option<Coordinates>> {
        self.get_at(key, now())
    }

    fn get_at(&self, key: &QueryKey, now: i64) -> Option<Option<Coordinates>> {
        self.entries
            .get(&key.cache_key())
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.coordinates)
    }

    /// Store the outcome of a lookup
    pub fn insert(&mut self, key: &QueryKey, coordinates: Option<Coordinates>) {
        self.insert_at(key, coordinates, now());
    }

    fn insert_at(&mut self, key: &QueryKey, coordinates: Option<Coordinates>, cached_at: i64) {
        self.entries.insert(
            key.cache_key(),
            CacheEntry {
                coordinates,
                cached_at,
            },
        );
    }

    /// Drop entries that have outlived the TTL
    pub fn purge_expired(&mut self) -> usize {
        let now = now();
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
