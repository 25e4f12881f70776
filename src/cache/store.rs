// Key/value backends for the price cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::{FetcherError, FetcherResult};
use crate::paths;

/// String-keyed, string-valued persistent storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> FetcherResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> FetcherResult<()>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform data directory
    pub fn in_data_directory() -> Self {
        Self::new(paths::get_data_directory())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> FetcherResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetcherError::Persistence(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> FetcherResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            FetcherError::Persistence(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        // Write-then-rename so a crash never leaves a truncated store
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value).map_err(|e| {
            FetcherError::Persistence(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            FetcherError::Persistence(format!("Failed to replace {}: {}", path.display(), e))
        })
    }
}

/// In-process store for `--no-persist` runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Place a raw value without counting it as a write
    pub fn seed(&self, key: &str, value: &str) {
        let mut data = match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> FetcherResult<Option<String>> {
        let data = self
            .data
            .lock()
            .map_err(|_| FetcherError::Persistence("memory store lock poisoned".to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> FetcherResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| FetcherError::Persistence("memory store lock poisoned".to_string()))?;
        data.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("prices").unwrap(), None);
        store.set("prices", "{\"a\":1}").unwrap();
        assert_eq!(store.get("prices").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(store.path_for("prices").ends_with("prices.json"));
        assert!(!store.path_for("prices").with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_file_store_unwritable_dir_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(&blocker);
        assert!(matches!(store.set("k", "v"), Err(FetcherError::Persistence(_))));
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let store = MemoryStore::new();
        store.seed("k", "seeded");
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("seeded"));

        store.set("k", "v").unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
