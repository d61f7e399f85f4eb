//! Directory-backed substrate.
//!
//! ```text
//! <data_dir>/
//!   patientRecords            # current value for key "patientRecords"
//!   patientRecords.corrupt    # set-aside value after a recovered corrupt load
//!   .patientRecords.tmp       # only present while a write is in flight
//! ```
//!
//! Writes land in a hidden temporary sibling, are flushed and synced, then renamed over the
//! target, so a reader never observes a half-written value.

use super::{KeyValueStore, StorageError};
use crate::validation::validate_storage_key;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
}

impl FileKeyValueStore {
    /// Opens (creating if needed) a store rooted at `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created, or exists as a file.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_storage_key(key)?;
        Ok(self.data_dir.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp_path = self.data_dir.join(format!(".{}.tmp", key));

        let mut file = File::create(&tmp_path).map_err(io_error(&tmp_path))?;
        file.write_all(value.as_bytes()).map_err(io_error(&tmp_path))?;
        file.flush().map_err(io_error(&tmp_path))?;
        file.sync_all().map_err(io_error(&tmp_path))?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(io_error(&path))?;
        tracing::debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.to_path_buf();
    move |source| StorageError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("medrec");

        let store = FileKeyValueStore::open(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.data_dir(), dir.as_path());
    }

    #[test]
    fn test_open_fails_when_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("not-a-dir");
        fs::write(&file_path, "x").unwrap();

        assert!(matches!(
            FileKeyValueStore::open(&file_path),
            Err(StorageError::Io { .. })
        ));
    }

    #[test]
    fn test_get_absent_key_is_none() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp.path()).unwrap();

        assert_eq!(store.get("patientRecords").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_value_and_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let mut store = FileKeyValueStore::open(temp.path()).unwrap();

        store.set("patientRecords", "[]").unwrap();
        store.set("patientRecords", "[{\"notes\":\"a\\nb\"}]").unwrap();

        assert_eq!(
            store.get("patientRecords").unwrap().as_deref(),
            Some("[{\"notes\":\"a\\nb\"}]")
        );
        assert!(!temp.path().join(".patientRecords.tmp").exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = FileKeyValueStore::open(temp.path()).unwrap();
            store.set("patientRecords", "[\"kept\"]").unwrap();
        }

        let reopened = FileKeyValueStore::open(temp.path()).unwrap();
        assert_eq!(
            reopened.get("patientRecords").unwrap().as_deref(),
            Some("[\"kept\"]")
        );
    }

    #[test]
    fn test_traversal_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let mut store = FileKeyValueStore::open(temp.path().join("data")).unwrap();

        assert!(matches!(
            store.set("../outside", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(!temp.path().join("outside").exists());
    }
}
