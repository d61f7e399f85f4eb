//! Draft sessions.
//!
//! A [`DraftSession`] holds at most one in-progress create or edit. Fields are edited on a
//! private copy, so nothing reaches the [`RecordStore`] until [`DraftSession::commit`] succeeds.
//!
//! ```text
//! Empty --start_new--> New -----------commit/discard--> Empty
//! Empty --start_edit-> Editing(id) ---commit/discard--> Empty
//! ```
//!
//! Starting a draft while one is active discards the previous one.
//!
//! ## Image references
//!
//! The session remembers which references it minted itself through
//! [`DraftSession::attach_images`]. When such a reference can no longer end up in a record (it
//! was removed, or the draft was discarded) it is handed back to the caller so the registry
//! entry can be revoked. References copied from a stored record are never handed back.

use crate::error::{RecordError, RecordResult};
use crate::record::{PatientRecord, RecordField, RecordFields, RecordId};
use crate::storage::KeyValueStore;
use crate::store::RecordStore;
use medrec_files::{FileHandle, ImageRef, ImageReferencer};

/// What a committed draft will do to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftMode {
    New,
    Editing(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    Created,
    Updated,
}

/// Result of a successful [`DraftSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub record: PatientRecord,
    pub action: CommitAction,
}

/// Result of [`DraftSession::remove_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedImage {
    pub reference: ImageRef,
    /// The session minted this reference and nothing in the draft points at it any more.
    pub orphaned: bool,
}

#[derive(Debug, Clone)]
struct ActiveDraft {
    mode: DraftMode,
    fields: RecordFields,
    minted: Vec<ImageRef>,
}

#[derive(Debug, Default)]
pub struct DraftSession {
    active: Option<ActiveDraft>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a blank draft for a new record.
    ///
    /// Returns references orphaned by discarding any draft that was already active.
    pub fn start_new(&mut self) -> Vec<ImageRef> {
        let orphaned = self.discard();
        self.active = Some(ActiveDraft {
            mode: DraftMode::New,
            fields: RecordFields::default(),
            minted: Vec::new(),
        });
        tracing::debug!("started new patient draft");
        orphaned
    }

    /// Begins editing a copy of `record`. The record itself is not touched.
    ///
    /// Returns references orphaned by discarding any draft that was already active.
    pub fn start_edit(&mut self, record: &PatientRecord) -> Vec<ImageRef> {
        let orphaned = self.discard();
        self.active = Some(ActiveDraft {
            mode: DraftMode::Editing(record.id().clone()),
            fields: record.fields().clone(),
            minted: Vec::new(),
        });
        tracing::debug!("started editing patient record {}", record.id());
        orphaned
    }

    /// Overwrites one text field of the draft.
    pub fn set_field(&mut self, field: RecordField, value: impl Into<String>) -> RecordResult<()> {
        self.active_mut()?.fields.set(field, value);
        Ok(())
    }

    /// Derives a reference for each file and appends them in the order supplied.
    ///
    /// No deduplication or type checking takes place: the same file attached twice yields two
    /// distinct references. Returns the newly appended references.
    pub fn attach_images<I, R>(
        &mut self,
        files: I,
        referencer: &mut R,
    ) -> RecordResult<Vec<ImageRef>>
    where
        I: IntoIterator,
        I::Item: FileHandle,
        R: ImageReferencer + ?Sized,
    {
        let draft = self.active_mut()?;

        let attached: Vec<ImageRef> = files
            .into_iter()
            .map(|file| referencer.reference_for(&file))
            .collect();

        draft.fields.images.extend(attached.iter().cloned());
        draft.minted.extend(attached.iter().cloned());
        tracing::debug!("attached {} images to draft", attached.len());
        Ok(attached)
    }

    /// Removes the image at `index`, shifting later images down.
    ///
    /// # Errors
    ///
    /// - [`RecordError::NoActiveDraft`] if no draft is active
    /// - [`RecordError::IndexOutOfRange`] if `index` is not a valid position; the list is left
    ///   unchanged
    pub fn remove_image(&mut self, index: usize) -> RecordResult<RemovedImage> {
        let draft = self.active_mut()?;
        let len = draft.fields.images.len();
        if index >= len {
            return Err(RecordError::IndexOutOfRange { index, len });
        }

        let reference = draft.fields.images.remove(index);
        let orphaned =
            draft.minted.contains(&reference) && !draft.fields.images.contains(&reference);
        if orphaned {
            draft.minted.retain(|minted| minted != &reference);
        }

        Ok(RemovedImage {
            reference,
            orphaned,
        })
    }

    /// Validates the draft and hands it to `store`.
    ///
    /// On success the session returns to empty and the persisted record is returned.
    ///
    /// # Errors
    ///
    /// - [`RecordError::NoActiveDraft`] if no draft is active
    /// - [`RecordError::Validation`] listing every blank required field; the draft is kept so
    ///   the caller can fix it and retry. Values are trimmed before the check, so a field holding
    ///   only whitespace counts as blank
    /// - [`RecordError::NotFound`] if the edited record has been deleted meanwhile; the draft is
    ///   kept
    /// - [`RecordError::Unsaved`] if the store applied the change but could not persist it; the
    ///   session is empty afterwards since the change is already in the store
    pub fn commit<S: KeyValueStore>(
        &mut self,
        store: &mut RecordStore<S>,
    ) -> RecordResult<CommitResult> {
        let draft = self.active.as_ref().ok_or(RecordError::NoActiveDraft)?;

        let missing = draft.fields.missing_required();
        if !missing.is_empty() {
            return Err(RecordError::Validation { missing });
        }

        let outcome = match &draft.mode {
            DraftMode::New => store
                .create(draft.fields.clone())
                .map(|record| (record, CommitAction::Created)),
            DraftMode::Editing(id) => store
                .update(id, draft.fields.clone())
                .map(|record| (record, CommitAction::Updated)),
        };

        match outcome {
            Ok((record, action)) => {
                self.active = None;
                tracing::info!("committed patient draft ({:?}) as {}", action, record.id());
                Ok(CommitResult { record, action })
            }
            Err(e @ RecordError::Unsaved { .. }) => {
                self.active = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Drops the draft without touching any store.
    ///
    /// Returns the references this session minted that are now unreachable. Discarding an empty
    /// session is a no-op.
    pub fn discard(&mut self) -> Vec<ImageRef> {
        match self.active.take() {
            Some(draft) => {
                tracing::debug!("discarded patient draft ({:?})", draft.mode);
                draft.minted
            }
            None => Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn mode(&self) -> Option<&DraftMode> {
        self.active.as_ref().map(|draft| &draft.mode)
    }

    pub fn fields(&self) -> Option<&RecordFields> {
        self.active.as_ref().map(|draft| &draft.fields)
    }

    pub fn images(&self) -> &[ImageRef] {
        self.active
            .as_ref()
            .map(|draft| draft.fields.images.as_slice())
            .unwrap_or(&[])
    }

    fn active_mut(&mut self) -> RecordResult<&mut ActiveDraft> {
        self.active.as_mut().ok_or(RecordError::NoActiveDraft)
    }
}
