//! Persistence substrates.
//!
//! The record store only needs a string-valued key-value store: one `get` at load time and a
//! whole-value `set` after every mutation. [`KeyValueStore`] captures exactly that, so the
//! store can sit on top of anything from browser-style local storage to a directory of files.
//!
//! ## Implementations
//!
//! - [`MemoryKeyValueStore`]: a `HashMap`, for embedding and tests. Can be told to reject
//!   writes, standing in for a full disk or an exceeded quota.
//! - [`FileKeyValueStore`]: one file per key inside a directory, replaced atomically on write.
//!
//! Neither implementation guards against two processes writing the same key; the last writer
//! wins.

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage rejected write to '{0}'")]
    WriteRejected(String),
    #[error("I/O error on {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A local key-value string store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}
