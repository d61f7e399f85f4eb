use crate::record::{RecordField, RecordId};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("missing required fields: {}", field_list(.missing))]
    Validation { missing: Vec<RecordField> },
    #[error("patient record not found: {0}")]
    NotFound(RecordId),
    #[error("image index {index} is out of range (draft has {len} images)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no draft is active")]
    NoActiveDraft,

    #[error("stored patient records are corrupt: {0}")]
    PersistenceCorruption(#[source] serde_json::Error),
    /// The in-memory change stands; only the durable write failed. Retry with `save()`.
    #[error("changes applied but not saved: {source}")]
    Unsaved {
        id: Option<RecordId>,
        #[source]
        source: StorageError,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to serialise patient records: {0}")]
    Serialization(serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] medrec_types::TextError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

fn field_list(fields: &[RecordField]) -> String {
    fields
        .iter()
        .map(|field| field.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}
