//! Core runtime configuration.
//!
//! Resolved once at startup and handed to [`crate::RecordStore`]. Nothing in the core reads
//! environment variables; front ends decide where values come from.

use crate::constants::{CORRUPT_BACKUP_SUFFIX, DEFAULT_STORAGE_KEY};
use crate::validation::validate_storage_key;
use crate::{RecordError, RecordResult};
use medrec_types::NonEmptyText;
use std::str::FromStr;

/// What `load` does when the stored value cannot be parsed as a record list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorruptionPolicy {
    /// Fail the load with [`RecordError::PersistenceCorruption`].
    Fail,
    /// Set the unreadable value aside under the backup key, warn, and start empty.
    #[default]
    RecoverEmpty,
}

impl FromStr for CorruptionPolicy {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "recover" | "recover-empty" | "recover_empty" => Ok(Self::RecoverEmpty),
            other => Err(RecordError::InvalidInput(format!(
                "unknown corruption policy '{}' (expected 'fail' or 'recover')",
                other
            ))),
        }
    }
}

/// Record store configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    storage_key: String,
    corruption_policy: CorruptionPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            corruption_policy: CorruptionPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Create a new `StoreConfig`.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Text`] if `storage_key` is blank
    /// - [`RecordError::InvalidInput`] if it, or the backup key derived from it, is not a valid
    ///   storage key
    pub fn new(
        storage_key: impl AsRef<str>,
        corruption_policy: CorruptionPolicy,
    ) -> RecordResult<Self> {
        let storage_key = NonEmptyText::new(storage_key)?.into_inner();
        let cfg = Self {
            storage_key,
            corruption_policy,
        };

        // Recovery writes under the backup key, so it must be valid too.
        for key in [cfg.storage_key(), cfg.backup_key().as_str()] {
            validate_storage_key(key).map_err(|e| RecordError::InvalidInput(e.to_string()))?;
        }
        Ok(cfg)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Key that receives an unreadable value before recovery overwrites it.
    pub fn backup_key(&self) -> String {
        format!("{}{}", self.storage_key, CORRUPT_BACKUP_SUFFIX)
    }

    pub fn corruption_policy(&self) -> CorruptionPolicy {
        self.corruption_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_STORAGE_KEY_LEN;

    #[test]
    fn test_default_config() {
        let cfg = StoreConfig::default();

        assert_eq!(cfg.storage_key(), "patientRecords");
        assert_eq!(cfg.backup_key(), "patientRecords.corrupt");
        assert_eq!(cfg.corruption_policy(), CorruptionPolicy::RecoverEmpty);
        assert!(validate_storage_key(cfg.storage_key()).is_ok());
    }

    #[test]
    fn test_new_trims_and_validates_key() {
        let cfg = StoreConfig::new("  clinicRecords ", CorruptionPolicy::Fail).unwrap();
        assert_eq!(cfg.storage_key(), "clinicRecords");

        assert!(matches!(
            StoreConfig::new("   ", CorruptionPolicy::Fail),
            Err(RecordError::Text(_))
        ));
        assert!(matches!(
            StoreConfig::new("../records", CorruptionPolicy::Fail),
            Err(RecordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_key_must_leave_room_for_backup_suffix() {
        let longest = MAX_STORAGE_KEY_LEN - CORRUPT_BACKUP_SUFFIX.len();

        let cfg = StoreConfig::new("k".repeat(longest), CorruptionPolicy::RecoverEmpty).unwrap();
        assert_eq!(cfg.backup_key().len(), MAX_STORAGE_KEY_LEN);

        assert!(matches!(
            StoreConfig::new("k".repeat(longest + 1), CorruptionPolicy::RecoverEmpty),
            Err(RecordError::InvalidInput(_))
        ));
        assert!(matches!(
            StoreConfig::new("k".repeat(MAX_STORAGE_KEY_LEN), CorruptionPolicy::RecoverEmpty),
            Err(RecordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_corruption_policy_from_str() {
        assert_eq!("fail".parse::<CorruptionPolicy>().unwrap(), CorruptionPolicy::Fail);
        assert_eq!(
            "Recover".parse::<CorruptionPolicy>().unwrap(),
            CorruptionPolicy::RecoverEmpty
        );
        assert!("ignore".parse::<CorruptionPolicy>().is_err());
    }
}
