//! Process-lifetime image references.
//!
//! [`ObjectUrlRegistry`] is the medrec analogue of a browser's object URL table: every call to
//! [`ImageReferencer::reference_for`] mints a fresh `blob:medrec/<uuid>` string and remembers
//! which local file it points at. Entries vanish when revoked or when the registry is dropped.

use crate::constants::REFERENCE_PREFIX;
use crate::handle::FileHandle;
use crate::FilesError;
use chrono::{DateTime, Utc};
use medrec_uuid::UuidService;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Opaque reference to an attached image, as stored in a patient record.
///
/// Any string is accepted so that records written by earlier versions (or by other tools)
/// load unchanged. Only references minted by a live registry can be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the reference has the shape minted by [`ObjectUrlRegistry`].
    ///
    /// A `true` result says nothing about whether it still resolves.
    pub fn is_object_url(&self) -> bool {
        self.0.starts_with(REFERENCE_PREFIX)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Derives a locally resolvable reference for a file handle.
///
/// This is the seam between a draft and whatever owns the reference table.
pub trait ImageReferencer {
    fn reference_for(&mut self, file: &dyn FileHandle) -> ImageRef;
}

/// What the registry knows about a minted reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub original_filename: String,
    pub source_path: PathBuf,

    /// Best-effort sniffed MIME type; `None` if the file was unreadable or unrecognised.
    pub media_type: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// In-memory table of live image references.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: HashMap<ImageRef, ImageEntry>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a live reference.
    pub fn resolve(&self, reference: &ImageRef) -> Option<&ImageEntry> {
        self.entries.get(reference)
    }

    /// Reads the current bytes behind a live reference.
    ///
    /// # Errors
    ///
    /// - [`FilesError::UnknownReference`] if the reference is not live in this registry
    /// - [`FilesError::Io`] if the source file can no longer be read
    pub fn read(&self, reference: &ImageRef) -> Result<Vec<u8>, FilesError> {
        let entry = self
            .resolve(reference)
            .ok_or_else(|| FilesError::UnknownReference(reference.to_string()))?;

        fs::read(&entry.source_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read image {}: {}",
                    entry.source_path.display(),
                    e
                ),
            ))
        })
    }

    /// Forgets a reference. Returns `true` if it was live.
    pub fn revoke(&mut self, reference: &ImageRef) -> bool {
        let removed = self.entries.remove(reference).is_some();
        if removed {
            tracing::debug!("revoked image reference {}", reference);
        }
        removed
    }

    /// Revokes every reference yielded by `references`, returning how many were live.
    pub fn revoke_all<'a>(&mut self, references: impl IntoIterator<Item = &'a ImageRef>) -> usize {
        references
            .into_iter()
            .filter(|reference| self.revoke(reference))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ImageReferencer for ObjectUrlRegistry {
    fn reference_for(&mut self, file: &dyn FileHandle) -> ImageRef {
        let reference = ImageRef(format!("{}{}", REFERENCE_PREFIX, UuidService::new()));

        let media_type = infer::get_from_path(file.path())
            .ok()
            .flatten()
            .map(|kind| kind.mime_type().to_string());

        tracing::debug!(
            "minted image reference {} for {} ({})",
            reference,
            file.name(),
            media_type.as_deref().unwrap_or("unknown type")
        );

        self.entries.insert(
            reference.clone(),
            ImageEntry {
                original_filename: file.name().to_string(),
                source_path: file.path().to_path_buf(),
                media_type,
                created_at: Utc::now(),
            },
        );

        reference
    }
}
