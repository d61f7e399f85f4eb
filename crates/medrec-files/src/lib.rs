//! medrec image attachments
//!
//! Images attached to a patient record are stored as *references*, never as bytes. This crate
//! defines both sides of that contract:
//!
//! - [`FileHandle`]: what a file picker hands over (a name plus a local path). [`LocalFile`] is
//!   the filesystem implementation.
//! - [`ImageRef`]: the opaque string a record keeps in its `images` list.
//! - [`ObjectUrlRegistry`]: mints references for handles and resolves them back while the
//!   process is alive.
//!
//! ## Lifetime of a reference
//!
//! References behave like browser object URLs: they are valid only inside the registry that
//! minted them. A record persisted with `blob:medrec/...` entries will load fine after a
//! restart, but those entries no longer resolve. Nothing here copies or persists image bytes.
//!
//! ```no_run
//! use medrec_files::{ImageReferencer, LocalFile, ObjectUrlRegistry};
//!
//! let mut registry = ObjectUrlRegistry::new();
//! let scan = LocalFile::new("/tmp/chest-xray.png");
//! let reference = registry.reference_for(&scan);
//! assert!(registry.resolve(&reference).is_some());
//! ```

mod constants;
mod handle;
mod registry;

pub use constants::REFERENCE_PREFIX;
pub use handle::{FileHandle, LocalFile};
pub use registry::{ImageEntry, ImageRef, ImageReferencer, ObjectUrlRegistry};

/// Errors that can occur while dereferencing image references.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The reference was never minted here, or has been revoked.
    #[error("Unknown image reference: {0}")]
    UnknownReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
