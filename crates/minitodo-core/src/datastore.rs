use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const TASKS_KEY: &str = "miniTodoApp.tasks";
pub const STATUS_FILTER_KEY: &str = "miniTodoApp.statusFilter";
pub const PRIORITY_FILTER_KEY: &str = "miniTodoApp.priorityFilter";

/// Synchronous string key-value surface the board persists into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One file per key inside a data directory.
#[derive(Debug)]
pub struct FileStore {
    pub data_dir: PathBuf,
}

impl FileStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened file store");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("invalid storage key: {key:?}"));
        }
        Ok(self.data_dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    #[tracing::instrument(skip(self))]
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(file = %path.display(), bytes = raw.len(), "read key");
                Ok(Some(raw))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed reading {}", path.display())),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        debug!(file = %path.display(), bytes = value.len(), "writing key atomically");

        let mut temp = NamedTempFile::new_in(&self.data_dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;

        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        Ok(())
    }
}

/// In-process store, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Backend whose every read and write fails.
#[cfg(test)]
pub(crate) struct ReadOnlyStore;

#[cfg(test)]
impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow!("storage unavailable"))
    }

    fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
        Err(anyhow!("quota exceeded"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{FileStore, KeyValueStore, MemoryStore, TASKS_KEY};

    #[test]
    fn file_store_roundtrip_and_missing_key() {
        let temp = tempdir().expect("tempdir");
        let mut store = FileStore::open(&temp.path().join("nested")).expect("open store");

        assert_eq!(store.get(TASKS_KEY).expect("get missing"), None);

        store.set(TASKS_KEY, "[]").expect("first write");
        store.set(TASKS_KEY, "[1]").expect("overwrite");
        assert_eq!(store.get(TASKS_KEY).expect("get"), Some("[1]".to_string()));
        assert!(temp.path().join("nested").join(TASKS_KEY).exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = tempdir().expect("tempdir");
        let mut store = FileStore::open(temp.path()).expect("open store");
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryStore::new().with_entry("k", "a");
        store.set("k", "b").expect("set");
        assert_eq!(store.get("k").expect("get"), Some("b".to_string()));
    }
}
