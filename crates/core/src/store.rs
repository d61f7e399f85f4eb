//! The record store.
//!
//! [`RecordStore`] owns the canonical, most-recent-first list of patient records and mirrors
//! it into a [`KeyValueStore`] after every mutation. The whole list is serialised as one JSON
//! array under the configured key; there is no incremental persistence and no log.
//!
//! ## Write failures
//!
//! A mutation is applied in memory first and then persisted. If persisting fails, the change is
//! kept (the caller sees it in [`RecordStore::list`]) and [`RecordError::Unsaved`] is returned.
//! Calling [`RecordStore::save`] retries the write.

use crate::config::{CorruptionPolicy, StoreConfig};
use crate::constants::MAX_ID_ATTEMPTS;
use crate::error::{RecordError, RecordResult};
use crate::record::{PatientRecord, RecordFields, RecordId};
use crate::search;
use crate::storage::KeyValueStore;
use chrono::Utc;
use medrec_uuid::TimestampIdGenerator;
use std::collections::HashSet;

/// Outcome of a [`RecordStore::load`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records now held in memory.
    pub loaded: usize,
    /// Stored records whose id was blank or duplicated and had to be replaced.
    pub reassigned_ids: Vec<RecordId>,
    /// The stored value was unreadable and has been set aside under the backup key.
    pub recovered_from_corruption: bool,
}

/// Authoritative in-memory collection of patient records backed by a substrate.
#[derive(Debug)]
pub struct RecordStore<S> {
    substrate: S,
    cfg: StoreConfig,
    records: Vec<PatientRecord>,
    ids: TimestampIdGenerator,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Creates an empty store without reading the substrate.
    pub fn new(substrate: S, cfg: StoreConfig) -> Self {
        Self {
            substrate,
            cfg,
            records: Vec::new(),
            ids: TimestampIdGenerator::new(),
        }
    }

    /// Creates a store and immediately [`load`](Self::load)s it.
    pub fn open(substrate: S, cfg: StoreConfig) -> RecordResult<(Self, LoadReport)> {
        let mut store = Self::new(substrate, cfg);
        let report = store.load()?;
        Ok((store, report))
    }

    /// Replaces the in-memory list with what the substrate holds.
    ///
    /// - No stored value: the list becomes empty.
    /// - Unparseable value: depends on [`CorruptionPolicy`]. `Fail` returns
    ///   [`RecordError::PersistenceCorruption`] and leaves memory untouched; `RecoverEmpty` copies
    ///   the raw value to [`StoreConfig::backup_key`], then starts empty.
    /// - Blank or duplicate ids in stored data get fresh ids so that ids stay unique. The list is
    ///   written back straight away, so the new ids survive the next load.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Storage`] if the substrate cannot be read, or the backup cannot be
    ///   written
    /// - [`RecordError::Unsaved`] if ids were reassigned but the list could not be written back;
    ///   the records are loaded and [`save`](Self::save) retries
    pub fn load(&mut self) -> RecordResult<LoadReport> {
        let key = self.cfg.storage_key().to_string();

        let Some(raw) = self.substrate.get(&key)? else {
            self.records.clear();
            tracing::info!("no stored patient records under '{}', starting empty", key);
            return Ok(LoadReport::default());
        };

        let report = match serde_json::from_str::<Vec<PatientRecord>>(&raw) {
            Ok(records) => {
                let reassigned_ids = self.accept_loaded(records);
                LoadReport {
                    loaded: self.records.len(),
                    reassigned_ids,
                    recovered_from_corruption: false,
                }
            }
            Err(e) => match self.cfg.corruption_policy() {
                CorruptionPolicy::Fail => return Err(RecordError::PersistenceCorruption(e)),
                CorruptionPolicy::RecoverEmpty => {
                    let backup_key = self.cfg.backup_key();
                    self.substrate.set(&backup_key, &raw)?;
                    self.records.clear();
                    tracing::warn!(
                        "stored patient records under '{}' are unreadable ({}); set aside as '{}' and starting empty",
                        key,
                        e,
                        backup_key
                    );
                    LoadReport {
                        recovered_from_corruption: true,
                        ..LoadReport::default()
                    }
                }
            },
        };

        tracing::info!("loaded {} patient records from '{}'", report.loaded, key);

        if let Some(first) = report.reassigned_ids.first().cloned() {
            self.persist_after(Some(&first))?;
        }
        Ok(report)
    }

    /// Writes the full list to the substrate.
    pub fn save(&mut self) -> RecordResult<()> {
        let json = serde_json::to_string(&self.records).map_err(RecordError::Serialization)?;
        self.substrate.set(self.cfg.storage_key(), &json)?;
        Ok(())
    }

    /// Stores a new record at the front of the list.
    ///
    /// # Errors
    ///
    /// [`RecordError::Unsaved`] if the record was added but could not be persisted.
    pub fn create(&mut self, fields: RecordFields) -> RecordResult<PatientRecord> {
        let id = self.allocate_id()?;
        let record = PatientRecord::new(id, fields, Utc::now());
        self.records.insert(0, record.clone());
        tracing::debug!("created patient record {}", record.id());

        self.persist_after(Some(record.id()))?;
        Ok(record)
    }

    /// Replaces every field of record `id` except its id and creation time. Position is kept.
    ///
    /// # Errors
    ///
    /// - [`RecordError::NotFound`] if no record has this id; nothing changes.
    /// - [`RecordError::Unsaved`] if the update was applied but could not be persisted.
    pub fn update(&mut self, id: &RecordId, fields: RecordFields) -> RecordResult<PatientRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| RecordError::NotFound(id.clone()))?;

        record.replace_fields(fields);
        let updated = record.clone();
        tracing::debug!("updated patient record {}", id);

        self.persist_after(Some(id))?;
        Ok(updated)
    }

    /// Removes record `id`. Deleting an unknown id is not an error.
    ///
    /// Returns whether a record was removed. The list is persisted either way.
    pub fn delete(&mut self, id: &RecordId) -> RecordResult<bool> {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        let removed = self.records.len() != before;

        if removed {
            tracing::debug!("deleted patient record {}", id);
        } else {
            tracing::debug!("delete of unknown patient record {} ignored", id);
        }

        self.persist_after(Some(id))?;
        Ok(removed)
    }

    /// Records in store order (most recent first).
    pub fn list(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Records whose name or diagnoses contain `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&PatientRecord> {
        search::filter(&self.records, query)
    }

    pub fn get(&self, id: &RecordId) -> Option<&PatientRecord> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    fn persist_after(&mut self, id: Option<&RecordId>) -> RecordResult<()> {
        match self.save() {
            Err(RecordError::Storage(source)) => {
                tracing::warn!("patient records changed but not saved: {}", source);
                Err(RecordError::Unsaved {
                    id: id.cloned(),
                    source,
                })
            }
            other => other,
        }
    }

    fn allocate_id(&mut self) -> RecordResult<RecordId> {
        for _attempt in 0..MAX_ID_ATTEMPTS {
            let candidate = RecordId::from(self.ids.next_id());
            if !self.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(RecordError::InvalidInput(format!(
            "failed to allocate a unique record id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    fn accept_loaded(&mut self, mut records: Vec<PatientRecord>) -> Vec<RecordId> {
        let mut seen = HashSet::new();
        let mut reassigned = Vec::new();

        for record in &mut records {
            if record.id().as_str().trim().is_empty() || !seen.insert(record.id().clone()) {
                let fresh = RecordId::from(self.ids.next_id());
                tracing::warn!(
                    "stored patient record '{}' has a blank or duplicate id; reassigned to {}",
                    record.id(),
                    fresh
                );
                seen.insert(fresh.clone());
                record.reassign_id(fresh.clone());
                reassigned.push(fresh);
            }
        }

        self.records = records;
        reassigned
    }
}
