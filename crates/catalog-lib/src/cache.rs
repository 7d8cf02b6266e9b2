//! Time-boxed file cache for catalog snapshots
//!
//! One JSON file per key, stamped with its write time in Unix milliseconds.
//! Lookups report why they missed so callers can tell "never cached" from
//! "expired" from "corrupt"; expired and corrupt entries are deleted on read.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// On-disk envelope for a cached value
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    timestamp_ms: i64,
    data: T,
}

/// Why a lookup produced no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMiss {
    /// No entry exists for the key
    Absent,
    /// The entry was older than the TTL; it has been deleted
    Expired,
    /// The entry did not parse; it has been deleted
    Corrupt,
    /// The entry exists but reading it failed
    Unreadable,
}

/// Outcome of a cache lookup
#[derive(Debug, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss(CacheMiss),
}

impl<T> CacheLookup<T> {
    /// The hit value, discarding any miss reason
    pub fn into_hit(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to serialize cache entry")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write cache entry")]
    Io(#[from] std::io::Error),
}

/// File-per-key cache with a millisecond TTL
///
/// Writes go through a temp file and a rename, so overlapping picker
/// invocations see either the old snapshot or the new one, never a torn file.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl_ms: u64,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_ms: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_ms,
        }
    }

    /// Cache rooted under the per-user cache directory
    pub fn in_user_cache_dir(ttl_ms: u64) -> Self {
        let base = dirs_next::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("orbpick"), ttl_ms)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let path = self.entry_path(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return CacheLookup::Miss(CacheMiss::Absent);
            }
            Err(e) => {
                warn!(key, error = %e, "Cache entry unreadable");
                return CacheLookup::Miss(CacheMiss::Unreadable);
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "Dropping corrupt cache entry");
                self.remove(key);
                return CacheLookup::Miss(CacheMiss::Corrupt);
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp_ms;
        if age_ms > self.ttl_ms as i64 {
            debug!(key, age_ms, "Dropping expired cache entry");
            self.remove(key);
            return CacheLookup::Miss(CacheMiss::Expired);
        }

        CacheLookup::Hit(entry.data)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry {
            timestamp_ms: Utc::now().timestamp_millis(),
            data: value,
        };
        let json = serde_json::to_vec(&entry).map_err(CacheError::Serialize)?;

        let path = self.entry_path(key);
        let temp_path = path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    /// Best-effort delete; a missing entry is fine
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}
