//! Constants used throughout the medrec core crate.

/// Key under which the full record list is stored.
pub const DEFAULT_STORAGE_KEY: &str = "patientRecords";

/// Suffix appended to the storage key when an unreadable record list is set aside.
pub const CORRUPT_BACKUP_SUFFIX: &str = ".corrupt";

/// Default directory for the file-backed substrate when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "medrec_data";

/// How many fresh ids to try before giving up on allocating a unique one.
pub(crate) const MAX_ID_ATTEMPTS: usize = 5;

/// Upper bound on storage key length; keys double as file names.
pub(crate) const MAX_STORAGE_KEY_LEN: usize = 128;
