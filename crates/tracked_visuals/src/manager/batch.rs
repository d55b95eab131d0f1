//! Batch normalisation
//!
//! Sources should deliver disjoint added/updated/removed collections. When
//! one does not, an id is kept only in the collection with the highest
//! precedence: removed, then added, then updated.

use crate::tracking::{TrackableId, TrackableRecord, TrackablesChanged};
use std::collections::HashSet;

/// A batch whose three collections share no ids
#[derive(Debug)]
pub(crate) struct NormalizedBatch<'a> {
    pub added: Vec<&'a TrackableRecord>,
    pub updated: Vec<&'a TrackableRecord>,
    pub removed: &'a [TrackableId],
    /// Records dropped because their id had higher-precedence entries
    pub conflicts: usize,
}

pub(crate) fn normalize(batch: &TrackablesChanged) -> NormalizedBatch<'_> {
    let removed: HashSet<TrackableId> = batch.removed.iter().copied().collect();
    let mut conflicts = 0;

    let added: Vec<&TrackableRecord> = batch
        .added
        .iter()
        .filter(|record| {
            let keep = !removed.contains(&record.id);
            conflicts += usize::from(!keep);
            keep
        })
        .collect();

    let added_ids: HashSet<TrackableId> = added.iter().map(|record| record.id).collect();
    let updated: Vec<&TrackableRecord> = batch
        .updated
        .iter()
        .filter(|record| {
            let keep = !removed.contains(&record.id) && !added_ids.contains(&record.id);
            conflicts += usize::from(!keep);
            keep
        })
        .collect();

    NormalizedBatch {
        added,
        updated,
        removed: &batch.removed,
        conflicts,
    }
}
