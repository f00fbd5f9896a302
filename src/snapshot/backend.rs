//! Key-value persistence backends for the snapshot store.
//!
//! Keys are `/`-separated paths such as `blobs/<hash>`. Both backends list keys
//! in lexicographic order.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{MapError, Result};

/// Minimal storage contract needed by [`super::SnapshotStore`]
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write or overwrite a key
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Write a key only if it does not exist yet. Returns `false` when it already did.
    fn insert_new(&self, key: &str, value: &[u8]) -> Result<bool>;

    /// All keys starting with `prefix`, sorted
    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-local backend, mainly for tests and short-lived sessions
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored value without any checks.
    ///
    /// Lets tests simulate bit rot underneath the store.
    pub fn tamper(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.put(key, &value)
    }
}

fn poisoned<T>(_: T) -> MapError {
    MapError::Storage("memory backend lock poisoned".to_string())
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn insert_new(&self, key: &str, value: &[u8]) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// One file per key below a root directory
#[derive(Clone, Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a backend rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened file snapshot backend");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('\\')
                || segment.ends_with(".tmp")
            {
                return Err(MapError::Storage(format!("invalid key '{}'", key)));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Unique sibling of `path` that key listing ignores
    fn scratch_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    fn write_synced(path: &Path, value: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(value)?;
        file.sync_all()?;
        Ok(())
    }

    fn discard(tmp: &Path) {
        if let Err(e) = fs::remove_file(tmp) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %tmp.display(), error = %e, "failed to remove scratch file");
            }
        }
    }

    fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };
            if entry.file_type()?.is_dir() {
                Self::collect_keys(&entry.path(), &key, keys)?;
            } else if !key.ends_with(".tmp") {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        Self::ensure_parent(&path)?;
        // Write then rename so readers never see a half-written file
        let tmp = Self::scratch_path(&path);
        let result = Self::write_synced(&tmp, value).and_then(|()| Ok(fs::rename(&tmp, &path)?));
        if result.is_err() {
            Self::discard(&tmp);
        }
        result
    }

    fn insert_new(&self, key: &str, value: &[u8]) -> Result<bool> {
        let path = self.path_for(key)?;
        Self::ensure_parent(&path)?;
        // The key only appears once its file is complete; linking fails if it already exists
        let tmp = Self::scratch_path(&path);
        let result = Self::write_synced(&tmp, value).and_then(|()| match fs::hard_link(&tmp, &path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        });
        Self::discard(&tmp);
        result
    }

    fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        Self::collect_keys(&self.root, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}
