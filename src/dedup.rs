//! Duplicate-sequence detection and removal
//!
//! Sequences are compared by exact string equality. Callers wanting case-insensitive
//! deduplication must normalize case first.

use std::collections::{HashMap, HashSet};

use crate::{Record, RecordCollection};

/// Number of records kept and dropped by a deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupSummary {
    pub kept: usize,
    pub removed: usize,
}

/// Returns the records whose sequence was not seen earlier in the collection
///
/// The first record of every distinct sequence is kept with its original header, in
/// first-occurrence order.
#[must_use]
pub fn deduplicate(records: &[Record]) -> RecordCollection {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|record| seen.insert(record.sequence.as_str()))
        .cloned()
        .collect()
}

/// Removes later duplicates from `records` in place
pub fn deduplicate_in_place(records: &mut RecordCollection) -> DedupSummary {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    records.retain(|record| seen.insert(record.sequence.clone()));
    DedupSummary {
        kept: records.len(),
        removed: before - records.len(),
    }
}

/// Maps every sequence occurring at least twice to its number of occurrences
#[must_use]
pub fn find_duplicates(records: &[Record]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for record in records {
        *counts.entry(record.sequence.as_str()).or_default() += 1;
    }
    counts.retain(|_, count| *count > 1);
    counts
}
