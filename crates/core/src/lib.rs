//! # medrec Core
//!
//! Core business logic for the medrec patient record store.
//!
//! This crate contains the record model and everything needed to keep it durable:
//! - [`RecordStore`]: the authoritative, most-recent-first list of [`PatientRecord`]s, mirrored
//!   as a single JSON array into a [`KeyValueStore`] after every mutation
//! - [`DraftSession`]: one in-progress create or edit, isolated from the store until committed
//! - [`search`]: case-insensitive filtering on name and diagnoses
//! - [`storage`]: the key-value substrates (in-memory and directory-backed)
//!
//! **No presentation concerns**: rendering, prompts and argument parsing belong in the binary.
//!
//! ```no_run
//! use medrec_core::{DraftSession, FileKeyValueStore, RecordField, RecordStore, StoreConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let substrate = FileKeyValueStore::open("medrec_data")?;
//! let (mut store, _report) = RecordStore::open(substrate, StoreConfig::default())?;
//!
//! let mut draft = DraftSession::new();
//! draft.start_new();
//! draft.set_field(RecordField::Name, "Ana")?;
//! draft.set_field(RecordField::Age, "34")?;
//! draft.set_field(RecordField::Gender, "F")?;
//! draft.set_field(RecordField::Diagnoses, "Gripe")?;
//! draft.commit(&mut store)?;
//!
//! assert_eq!(store.search("gripe").len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod draft;
pub mod error;
pub mod record;
pub mod search;
pub mod storage;
pub mod store;
pub mod validation;

pub use config::{CorruptionPolicy, StoreConfig};
pub use draft::{CommitAction, CommitResult, DraftMode, DraftSession, RemovedImage};
pub use error::{RecordError, RecordResult};
pub use record::{PatientRecord, RecordField, RecordFields, RecordId};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use store::{LoadReport, RecordStore};

pub use medrec_files::{FileHandle, ImageRef, ImageReferencer, LocalFile, ObjectUrlRegistry};
