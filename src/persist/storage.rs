//! Key-value storage providers.
//!
//! The [`Storage`] trait mirrors the browser storage API: flat string keys
//! mapping to text values.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;

/// File extension used for stored items.
const ITEM_EXTENSION: &str = "item";

/// A flat key → text storage provider.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every stored value.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Shared handle to a storage provider.
pub type SharedStorage = Arc<dyn Storage>;

/// In-memory storage.
///
/// Clones share their contents, so a clone handed to a fresh
/// [`AppContext`](crate::AppContext) behaves like a page reload in the same
/// browser profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.items.write().clear();
        Ok(())
    }
}

/// Directory-backed storage, one file per key.
///
/// Writes go to a temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{ITEM_EXTENSION}")))
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        let temp_path = path.with_extension(format!("{ITEM_EXTENSION}.tmp"));

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            io_err(key)(e)
        };

        let mut file = fs::File::create(&temp_path).map_err(io_err(key))?;
        file.write_all(value.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        drop(file);

        fs::rename(&temp_path, &path).map_err(cleanup_and_err)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        let dir_key = self.dir.display().to_string();
        let entries = fs::read_dir(&self.dir).map_err(io_err(&dir_key))?;
        for entry in entries {
            let path = entry.map_err(io_err(&dir_key))?.path();
            if path.extension().is_some_and(|ext| ext == ITEM_EXTENSION) {
                fs::remove_file(&path).map_err(io_err(&dir_key))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_clones_share_items() {
        let storage = MemoryStorage::new();
        let reloaded = storage.clone();

        storage.set_item("demo", "{}").unwrap();
        assert_eq!(reloaded.get_item("demo").unwrap().as_deref(), Some("{}"));

        reloaded.remove_item("demo").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn memory_storage_clear() {
        let storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        assert_eq!(storage.len(), 2);
        storage.clear().unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert_eq!(storage.get_item("demo").unwrap(), None);
        storage.set_item("demo", "{\"name\":\"张三\"}").unwrap();
        assert_eq!(
            storage.get_item("demo").unwrap().as_deref(),
            Some("{\"name\":\"张三\"}")
        );
        assert!(!dir.path().join("demo.item.tmp").exists());

        storage.remove_item("demo").unwrap();
        storage.remove_item("demo").unwrap();
        assert_eq!(storage.get_item("demo").unwrap(), None);
    }

    #[test]
    fn file_storage_clear_only_touches_items() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        storage.set_item("a", "1").unwrap();

        storage.clear().unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                storage.set_item(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}
