//! Optional on-disk cache for fetched payloads.
//!
//! Entries are keyed by a caller-supplied cache key rather than by URL, so a
//! driver may cache a post-processed payload instead of the raw response.
//! Each entry is a JSON file `{ cachedAt, data }`; an entry is fresh for one
//! hour, after which the next fetch overwrites it. Writes go through a temp
//! file and rename so concurrent readers never observe a torn entry.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// How long an entry stays fresh, in seconds.
const FRESHNESS_SECS: i64 = 3600;

/// One cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// When the payload was stored.
    pub cached_at: DateTime<Utc>,
    /// The payload itself.
    pub data: serde_json::Value,
}

/// Content cache rooted at a directory of `<key>.json` entries.
#[derive(Debug, Clone)]
pub struct FetchCache {
    root: PathBuf,
}

impl FetchCache {
    /// Cache rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache at the default location under the working directory.
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }

    /// Root directory of this cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a fresh entry, or `None` when the entry is missing or stale.
    ///
    /// A corrupt entry is treated as a miss so a bad write never wedges a
    /// driver; the next store replaces it.
    #[must_use]
    pub fn load(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.entry_path(key);
        let raw = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, "discarding unreadable cache entry: {e}");
                return None;
            }
        };
        if (Utc::now() - entry.cached_at).num_seconds() >= FRESHNESS_SECS {
            debug!(key, "cache entry stale");
            return None;
        }
        debug!(key, "cache hit");
        Some(entry.data)
    }

    /// Store a payload under `key`, creating the cache directory if needed.
    pub fn store(&self, key: &str, data: serde_json::Value) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let entry = CacheEntry {
            cached_at: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        debug!(key, "cache entry written");
        Ok(())
    }

    /// Remove the cache directory and everything in it.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Keys are driver-chosen identifiers; flatten anything that is not
        // filename-safe so a key can never escape the cache root.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache_in_tempdir() -> (FetchCache, TempDir) {
        let dir = TempDir::new().unwrap();
        (FetchCache::new(dir.path().join("cache")), dir)
    }

    #[test]
    fn miss_on_empty_cache() {
        let (cache, _dir) = cache_in_tempdir();
        assert!(cache.load("gov-uk-api").is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let (cache, _dir) = cache_in_tempdir();
        let payload = json!({"results": [{"title": "Department for Transport"}]});
        cache.store("gov-uk-api", payload.clone()).unwrap();
        assert_eq!(cache.load("gov-uk-api"), Some(payload));
    }

    #[test]
    fn stale_entries_are_misses() {
        let (cache, _dir) = cache_in_tempdir();
        cache.store("police", json!(["Kent Police"])).unwrap();

        // Rewrite the entry with a timestamp past the freshness window.
        let path = cache.entry_path("police");
        let entry = CacheEntry {
            cached_at: Utc::now() - Duration::hours(2),
            data: json!(["Kent Police"]),
        };
        fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        assert!(cache.load("police").is_none());
    }

    #[test]
    fn corrupt_entries_are_misses() {
        let (cache, _dir) = cache_in_tempdir();
        cache.store("nfcc", json!([])).unwrap();
        fs::write(cache.entry_path("nfcc"), "{not json").unwrap();
        assert!(cache.load("nfcc").is_none());
    }

    #[test]
    fn keys_are_sanitised_into_filenames() {
        let (cache, _dir) = cache_in_tempdir();
        cache.store("../escape/attempt", json!(1)).unwrap();
        let path = cache.entry_path("../escape/attempt");
        assert!(path.starts_with(cache.root()));
        assert_eq!(cache.load("../escape/attempt"), Some(json!(1)));
    }

    #[test]
    fn clear_removes_directory() {
        let (cache, _dir) = cache_in_tempdir();
        cache.store("a", json!(1)).unwrap();
        cache.clear().unwrap();
        assert!(!cache.root().exists());
        // Clearing twice is fine.
        cache.clear().unwrap();
    }
}
