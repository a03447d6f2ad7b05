use std::path::PathBuf;

use anyhow::{Context, Result};

/// String-keyed blob storage that survives restarts.
///
/// Implementations are synchronous and best-effort: callers log and carry
/// on when `set` fails (quota, permissions), since the in-memory copy is
/// always authoritative.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed store: one `{key}.json` per key under the cache directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Write-then-rename so a crash mid-write can't leave truncated JSON
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write cache file: {}", key))?;
        std::fs::rename(&tmp, self.path(key))
            .with_context(|| format!("Failed to commit cache file: {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", key))?;
        }
        Ok(())
    }
}

/// In-memory store for tests, with optional write-failure injection.
#[cfg(test)]
pub struct MemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(std::collections::HashMap::new()),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("injected write failure");
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("outagewatch-test-{}", std::process::id()));
        let store = FileStore::new(dir.clone()).unwrap();

        assert!(store.get("missing").unwrap().is_none());

        store.set("snapshot", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("snapshot").unwrap().as_deref(), Some(r#"{"a":1}"#));

        store.remove("snapshot").unwrap();
        assert!(store.get("snapshot").unwrap().is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_set_commits_atomically() {
        let dir = std::env::temp_dir().join(format!("outagewatch-atomic-{}", std::process::id()));
        let store = FileStore::new(dir.clone()).unwrap();

        store.set("geocode", r#"{"old":true}"#).unwrap();
        store.set("geocode", r#"{"new":true}"#).unwrap();

        assert_eq!(store.get("geocode").unwrap().as_deref(), Some(r#"{"new":true}"#));
        // No staging file left behind after the rename
        assert!(!dir.join("geocode.json.tmp").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_store_write_failure_injection() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        store.fail_writes(true);
        assert!(store.set("k", "v2").is_err());
        // Old value untouched
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
