//! Input validation utilities.

use crate::constants::MAX_STORAGE_KEY_LEN;
use crate::storage::StorageError;

/// Validates that a storage key is safe to use as a file name.
///
/// Keys are used verbatim by [`crate::storage::FileKeyValueStore`], so they are restricted to
/// a conservative ASCII set:
/// - not empty, at most 128 characters
/// - only alphanumerics, `.`, `-` and `_`
/// - no leading `.` (hidden files are reserved for in-flight writes)
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first rule broken.
pub fn validate_storage_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("storage key cannot be empty".into()));
    }

    if key.len() > MAX_STORAGE_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "storage key exceeds maximum length of {} characters",
            MAX_STORAGE_KEY_LEN
        )));
    }

    if key.starts_with('.') {
        return Err(StorageError::InvalidKey(format!(
            "storage key must not start with '.': '{}'",
            key
        )));
    }

    let ok = key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(StorageError::InvalidKey(format!(
            "storage key contains invalid characters (only alphanumeric, '.', '-', '_' allowed): '{}'",
            key
        )));
    }

    Ok(())
}
