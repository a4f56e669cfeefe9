// src/core/storage.rs

use crate::core::paths::{self, PathsError};
use crate::models::Table;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The store location could not be determined.
    #[error("Path error: {0}")]
    Path(#[from] PathsError),
    /// The store file exists but could not be decoded.
    #[error("Failed to decode from binary format: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
    /// The root table could not be encoded.
    #[error("Failed to encode to binary format: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Where a store's persisted root lives between sessions.
pub trait Storage {
    /// Loads the persisted root, `None` if nothing was saved yet.
    fn load(&self) -> StorageResult<Option<Table>>;
    /// Persists the root.
    fn save(&self, root: &Table) -> StorageResult<()>;
}

/// In-process storage. Clones share the same slot, so a test can keep one
/// handle and inspect what the store saved through another.
#[derive(Clone, Default, Debug)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<Table>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved root.
    pub fn saved(&self) -> Option<Table> {
        self.slot.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> StorageResult<Option<Table>> {
        Ok(self.slot.borrow().as_ref().map(Table::deep_clone))
    }

    fn save(&self, root: &Table) -> StorageResult<()> {
        *self.slot.borrow_mut() = Some(root.deep_clone());
        Ok(())
    }
}

/// A bincode file on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default store file for `namespace` in the tierdb config directory.
    pub fn for_namespace(namespace: &str) -> StorageResult<Self> {
        Ok(Self::new(paths::get_store_path(namespace)?))
    }

    /// A store file at a user supplied path; `~` and env vars are expanded.
    pub fn from_user_path(raw: &str) -> StorageResult<Self> {
        Ok(Self::new(paths::expand_user_path(raw)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> StorageResult<Option<Table>> {
        if !self.path.exists() {
            log::debug!("No store at '{}'; starting empty.", self.path.display());
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let (root, _): (Table, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        log::debug!("Loaded store from '{}'.", self.path.display());
        Ok(Some(root))
    }

    fn save(&self, root: &Table) -> StorageResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let bytes = bincode::serde::encode_to_vec(root, bincode::config::standard())?;
        fs::write(&self.path, bytes)?;
        log::info!("Saved store to '{}'.", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_resolver::{get_path, set_path};
    use crate::models::Value;
    use tempfile::tempdir;

    fn sample_root() -> Table {
        let root = Table::new();
        set_path(&root, "profiles.Default.scale", Value::from(1.5)).unwrap();
        set_path(&root, "profiles.Default.bars[2].enabled", Value::from(true)).unwrap();
        set_path(&root, "profileKeys.alice", Value::from("Default")).unwrap();
        root
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("store.bin"));

        assert!(storage.load().unwrap().is_none());
        let root = sample_root();
        storage.save(&root).unwrap();

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded, root);
        assert_eq!(
            get_path(&loaded, "profiles.Default.bars[2].enabled").unwrap(),
            Some(Value::from(true))
        );
    }

    #[test]
    fn test_file_storage_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.bin");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();

        let result = FileStorage::new(path).load();
        assert!(matches!(result, Err(StorageError::BincodeDecode(_))));
    }

    #[test]
    fn test_memory_storage_shares_slot_between_clones() {
        let storage = MemoryStorage::new();
        let observer = storage.clone();
        let root = sample_root();

        storage.save(&root).unwrap();
        root.clear();

        let saved = observer.saved().unwrap();
        assert_eq!(
            get_path(&saved, "profileKeys.alice").unwrap(),
            Some(Value::from("Default"))
        );
    }
}
