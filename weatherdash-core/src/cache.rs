//! Location-keyed snapshot storage.
//!
//! Keys are the location strings exactly as the user typed them. Writes are
//! best effort: a failed persist is logged and otherwise ignored.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::model::{CacheEntry, WeatherSnapshot};

pub trait LocationCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Stores `snapshot` under `key`, replacing any previous entry.
    fn put(&self, key: &str, snapshot: &WeatherSnapshot);
}

/// Process-local cache. Used by tests and `--no-cache` sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry with an explicit timestamp.
    pub fn insert_entry(&self, key: &str, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocationCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, snapshot: &WeatherSnapshot) {
        self.insert_entry(key, CacheEntry::new(snapshot.clone()));
    }
}

/// Durable cache: one JSON document mapping location to entry.
///
/// Entries are kept as raw JSON and only decoded on `get`, so one entry
/// with an outdated shape does not make the others unreadable.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

type RawEntries = HashMap<String, serde_json::Value>;

impl FileCache {
    pub const FILE_NAME: &'static str = "locations.json";

    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(Self::FILE_NAME), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every stored entry.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;

        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove cache file: {}", self.path.display())
            })?;
        }

        Ok(())
    }

    fn read_raw(&self) -> RawEntries {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return RawEntries::new(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read weather cache");
                return RawEntries::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "weather cache is corrupt, ignoring it");
            RawEntries::new()
        })
    }

    fn write_raw(&self, entries: &RawEntries) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(entries).context("Failed to serialize weather cache")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))
    }
}

impl LocationCache for FileCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let _guard = self.lock.lock().ok()?;
        let raw = self.read_raw().remove(key)?;

        match serde_json::from_value(raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(location = key, error = %err, "cached entry has an unexpected shape, ignoring it");
                None
            }
        }
    }

    fn put(&self, key: &str, snapshot: &WeatherSnapshot) {
        let Ok(_guard) = self.lock.lock() else {
            warn!(location = key, "cache lock poisoned, skipping write");
            return;
        };

        let value = match serde_json::to_value(CacheEntry::new(snapshot.clone())) {
            Ok(value) => value,
            Err(err) => {
                warn!(location = key, error = %err, "failed to serialize snapshot, skipping write");
                return;
            }
        };

        let mut entries = self.read_raw();
        entries.insert(key.to_string(), value);

        match self.write_raw(&entries) {
            Ok(()) => debug!(location = key, "stored snapshot in cache"),
            Err(err) => warn!(location = key, error = %format!("{err:#}"), "failed to persist snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::snapshot;

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let manila = snapshot("Manila, Philippines", 88.0);

        cache.put("Manila", &manila);

        assert_eq!(cache.get("Manila").unwrap().snapshot, manila);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let manila = snapshot("Manila, Philippines", 88.0);

        FileCache::new(dir.path()).put("Manila", &manila);
        let reopened = FileCache::new(dir.path());

        assert_eq!(reopened.get("Manila").unwrap().snapshot, manila);
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let s1 = snapshot("Manila, Philippines", 88.0);
        let s2 = snapshot("Cebu, Philippines", 84.0);

        cache.put("Manila", &s1);
        cache.put("Cebu", &s2);

        assert_eq!(cache.get("Manila").unwrap().snapshot, s1);
        assert_eq!(cache.get("Cebu").unwrap().snapshot, s2);
    }

    #[test]
    fn keys_are_not_normalized() {
        let cache = MemoryCache::new();
        cache.put("Manila", &snapshot("Manila", 88.0));

        assert!(cache.get("manila").is_none());
        assert!(cache.get(" Manila").is_none());
        assert!(cache.get("Manila").is_some());
    }

    #[test]
    fn put_overwrites_silently() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache.put("Manila", &snapshot("Manila", 80.0));
        cache.put("Manila", &snapshot("Manila", 91.0));

        assert_eq!(cache.get("Manila").unwrap().snapshot.current_conditions.temp, 91.0);
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        fs::write(cache.path(), "{ not json").unwrap();

        assert!(cache.get("Manila").is_none());

        cache.put("Manila", &snapshot("Manila", 88.0));
        assert!(cache.get("Manila").is_some());
    }

    #[test]
    fn outdated_entry_is_absent_but_others_survive() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.put("Cebu", &snapshot("Cebu", 84.0));

        let mut raw: RawEntries =
            serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        raw.insert("Manila".into(), serde_json::json!({ "temp": 88 }));
        fs::write(cache.path(), serde_json::to_string(&raw).unwrap()).unwrap();

        assert!(cache.get("Manila").is_none());
        assert!(cache.get("Cebu").is_some());
    }

    #[test]
    fn put_swallows_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should be.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let cache = FileCache::new(&blocker);

        cache.put("Manila", &snapshot("Manila", 88.0));

        assert!(cache.get("Manila").is_none());
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.put("Manila", &snapshot("Manila", 88.0));

        cache.clear().unwrap();

        assert!(cache.get("Manila").is_none());
        assert!(!cache.path().exists());
        cache.clear().unwrap();
    }
}
