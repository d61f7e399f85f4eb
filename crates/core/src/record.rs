//! Patient record model.
//!
//! A [`PatientRecord`] is an identity (`id`, `createdAt`) wrapped around a set of editable
//! [`RecordFields`]. Only the fields are ever handed to a draft; the identity stays with the
//! store, which is how updates are kept from touching it.
//!
//! ## Wire format
//!
//! Records serialise to flat camelCase JSON objects:
//!
//! ```json
//! {
//!   "id": "20260111T143522.045Z-550e8400e29b41d4a716446655440000",
//!   "name": "Ana",
//!   "age": "34",
//!   "gender": "F",
//!   "diagnoses": "Gripe",
//!   "images": [],
//!   "createdAt": "2026-01-11T14:35:22.045Z"
//! }
//! ```
//!
//! Narrative fields that were never provided are omitted. Data written by the earlier
//! browser-only version used Spanish keys for the narrative fields (`historialClinico`,
//! `antecedentes`, `sintomas`, `diagnosticos`, `tratamientos`, `notas`); those are accepted on
//! read and rewritten with the current keys on the next save.

use crate::error::RecordError;
use chrono::{DateTime, Utc};
use medrec_files::ImageRef;
use medrec_uuid::TimestampId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque record identifier.
///
/// New ids are [`TimestampId`]s, but any string is accepted so that legacy ids (millisecond
/// counters such as `"1718000000000"`) keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TimestampId> for RecordId {
    fn from(id: TimestampId) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The free-text fields a draft can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Age,
    Gender,
    ClinicalHistory,
    PriorConditions,
    Symptoms,
    Diagnoses,
    Treatments,
    Notes,
}

impl RecordField {
    pub const ALL: [RecordField; 9] = [
        RecordField::Name,
        RecordField::Age,
        RecordField::Gender,
        RecordField::ClinicalHistory,
        RecordField::PriorConditions,
        RecordField::Symptoms,
        RecordField::Diagnoses,
        RecordField::Treatments,
        RecordField::Notes,
    ];

    /// Fields that must be non-blank for a draft to commit.
    pub const REQUIRED: [RecordField; 3] =
        [RecordField::Name, RecordField::Age, RecordField::Gender];

    /// The camelCase key used in the serialised record.
    pub fn wire_name(self) -> &'static str {
        match self {
            RecordField::Name => "name",
            RecordField::Age => "age",
            RecordField::Gender => "gender",
            RecordField::ClinicalHistory => "clinicalHistory",
            RecordField::PriorConditions => "priorConditions",
            RecordField::Symptoms => "symptoms",
            RecordField::Diagnoses => "diagnoses",
            RecordField::Treatments => "treatments",
            RecordField::Notes => "notes",
        }
    }

    fn legacy_name(self) -> Option<&'static str> {
        match self {
            RecordField::ClinicalHistory => Some("historialClinico"),
            RecordField::PriorConditions => Some("antecedentes"),
            RecordField::Symptoms => Some("sintomas"),
            RecordField::Diagnoses => Some("diagnosticos"),
            RecordField::Treatments => Some("tratamientos"),
            RecordField::Notes => Some("notas"),
            _ => None,
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RecordField {
    type Err = RecordError;

    /// Accepts the wire name, its snake_case or kebab-case spelling, or the legacy key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        RecordField::ALL
            .into_iter()
            .find(|field| {
                field.wire_name().to_lowercase() == folded
                    || field.legacy_name().is_some_and(|legacy| legacy.to_lowercase() == folded)
            })
            .ok_or_else(|| RecordError::InvalidInput(format!("unknown record field: '{}'", s)))
    }
}

/// Everything about a record that a draft may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub name: String,
    pub age: String,
    pub gender: String,

    #[serde(
        default,
        alias = "historialClinico",
        skip_serializing_if = "Option::is_none"
    )]
    pub clinical_history: Option<String>,
    #[serde(default, alias = "antecedentes", skip_serializing_if = "Option::is_none")]
    pub prior_conditions: Option<String>,
    #[serde(default, alias = "sintomas", skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, alias = "diagnosticos", skip_serializing_if = "Option::is_none")]
    pub diagnoses: Option<String>,
    #[serde(default, alias = "tratamientos", skip_serializing_if = "Option::is_none")]
    pub treatments: Option<String>,
    #[serde(default, alias = "notas", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Insertion-ordered image references. Duplicates are allowed.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl RecordFields {
    /// Current value of a text field; `None` only for an absent narrative field.
    pub fn get(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::Name => Some(&self.name),
            RecordField::Age => Some(&self.age),
            RecordField::Gender => Some(&self.gender),
            RecordField::ClinicalHistory => self.clinical_history.as_deref(),
            RecordField::PriorConditions => self.prior_conditions.as_deref(),
            RecordField::Symptoms => self.symptoms.as_deref(),
            RecordField::Diagnoses => self.diagnoses.as_deref(),
            RecordField::Treatments => self.treatments.as_deref(),
            RecordField::Notes => self.notes.as_deref(),
        }
    }

    /// Overwrites a text field. Narrative fields become present, even when `value` is empty.
    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RecordField::Name => self.name = value,
            RecordField::Age => self.age = value,
            RecordField::Gender => self.gender = value,
            RecordField::ClinicalHistory => self.clinical_history = Some(value),
            RecordField::PriorConditions => self.prior_conditions = Some(value),
            RecordField::Symptoms => self.symptoms = Some(value),
            RecordField::Diagnoses => self.diagnoses = Some(value),
            RecordField::Treatments => self.treatments = Some(value),
            RecordField::Notes => self.notes = Some(value),
        }
    }

    /// Required fields that are blank (empty or whitespace only), in declaration order.
    pub fn missing_required(&self) -> Vec<RecordField> {
        RecordField::REQUIRED
            .into_iter()
            .filter(|field| medrec_types::NonEmptyText::is_blank(self.get(*field).unwrap_or("")))
            .collect()
    }
}

/// A stored patient record.
///
/// `id` and `created_at` have no setters: once the store has stamped them they cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    id: RecordId,
    #[serde(flatten)]
    fields: RecordFields,
    created_at: DateTime<Utc>,
}

impl PatientRecord {
    pub(crate) fn new(id: RecordId, fields: RecordFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fields,
            created_at,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn diagnoses(&self) -> Option<&str> {
        self.fields.diagnoses.as_deref()
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.fields.images
    }

    pub(crate) fn replace_fields(&mut self, fields: RecordFields) {
        self.fields = fields;
    }

    pub(crate) fn reassign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
