//! Record filtering.
//!
//! A record matches a query when its `name` or its `diagnoses` contains the query as a
//! substring, ignoring case. The empty query matches everything. The query is not trimmed.

use crate::record::PatientRecord;

/// Returns `true` if `record` matches `query`.
pub fn matches(record: &PatientRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    matches_folded(record, &query.to_lowercase())
}

/// Records matching `query`, in their original order.
pub fn filter<'a>(records: &'a [PatientRecord], query: &str) -> Vec<&'a PatientRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| matches_folded(record, &needle))
        .collect()
}

fn matches_folded(record: &PatientRecord, needle: &str) -> bool {
    record.name().to_lowercase().contains(needle)
        || record
            .diagnoses()
            .is_some_and(|diagnoses| diagnoses.to_lowercase().contains(needle))
}
