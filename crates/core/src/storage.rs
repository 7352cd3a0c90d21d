//! Durable key/value entries backing the session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A small string-to-string store that survives restarts.
///
/// `update` applies a batch of writes (`Some`) and removals (`None`) as one
/// unit, so related entries never land on disk half-changed.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn update(&mut self, entries: &[(&str, Option<&str>)]) -> Result<(), StorageError>;
}

/// JSON object on disk, rewritten atomically on every update.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt one is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), "ignoring corrupt session file: {e}");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), "cannot read session file: {e}");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&tmp, content).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn update(&mut self, entries: &[(&str, Option<&str>)]) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        apply(&mut next, entries);
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }
}

/// In-memory store. Clones share contents, so dropping one owner and
/// opening another on a clone behaves like a process restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn update(&mut self, entries: &[(&str, Option<&str>)]) -> Result<(), StorageError> {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        apply(&mut map, entries);
        Ok(())
    }
}

fn apply(map: &mut BTreeMap<String, String>, entries: &[(&str, Option<&str>)]) {
    for (key, value) in entries {
        match value {
            Some(value) => {
                map.insert((*key).to_string(), (*value).to_string());
            }
            None => {
                map.remove(*key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_through_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("session.json");

        let mut store = FileStore::open(&path);
        store
            .update(&[("access_token", Some("jwt")), ("username", Some("admin"))])
            .unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("access_token").as_deref(), Some("jwt"));
        assert_eq!(reopened.get("username").as_deref(), Some("admin"));
    }

    #[test]
    fn file_store_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = FileStore::open(&path);
        store.update(&[("a", Some("1")), ("b", Some("2"))]).unwrap();

        store.update(&[("a", None), ("b", None)]).unwrap();

        assert_eq!(FileStore::open(&path).get("a"), None);
        assert_eq!(FileStore::open(&path).get("b"), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get("access_token"), None);
    }

    #[test]
    fn failed_write_leaves_entries_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the rename fail.
        let path = dir.path().join("session.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let mut store = FileStore::open(&path);

        let err = store.update(&[("access_token", Some("jwt"))]);

        assert!(err.is_err());
        assert_eq!(store.get("access_token"), None);
    }

    #[test]
    fn memory_store_clones_share_contents() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.update(&[("k", Some("v"))]).unwrap();
        assert_eq!(b.get("k").as_deref(), Some("v"));
        assert_eq!(b.len(), 1);
    }
}
