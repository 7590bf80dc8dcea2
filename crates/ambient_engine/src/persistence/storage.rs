//! Key-value blob stores

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::StorageError;

/// Blob store addressed by name
pub trait Storage: Send + Sync {
    /// Durably store `blob` under `name`, replacing any previous value
    fn save(&self, name: &str, blob: &[u8]) -> Result<(), StorageError>;

    /// Fetch the blob stored under `name`, if any
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn save(&self, name: &str, blob: &[u8]) -> Result<(), StorageError> {
        (**self).save(name, blob)
    }

    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(name)
    }
}

/// Stores each blob as `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl Storage for FileStorage {
    fn save(&self, name: &str, blob: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write next to the target and rename so a crash never leaves half a file
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    blobs: HashMap<String, Vec<u8>>,
    saves: usize,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).saves
    }

    /// Raw blob stored under `name`
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .blobs
            .get(name)
            .cloned()
    }
}

impl Storage for MemoryStorage {
    fn save(&self, name: &str, blob: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.blobs.insert(name.to_string(), blob.to_vec());
        inner.saves += 1;
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.get(name))
    }
}
