//! Ranking order for retrieval.
//!
//! Key = (importance ↓, last_accessed ↓, created_at ↓, id)
//!
//! Strength is not part of the key: a highly important memory
//! that has faded outranks a fresh trivial one as long as both are live.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::types::MemoryRecord;

/// Total order placing the record to show first at the front.
#[must_use]
pub fn compare(a: &MemoryRecord, b: &MemoryRecord) -> Ordering {
    OrderedFloat(b.importance)
        .cmp(&OrderedFloat(a.importance))
        .then_with(|| b.last_accessed.cmp(&a.last_accessed))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.0.cmp(&b.id.0))
}

/// Keep live records, sort them by [`compare`] and truncate to `limit`.
#[must_use]
pub fn rank_records(records: Vec<MemoryRecord>, limit: usize, floor: f64) -> Vec<MemoryRecord> {
    let mut live: Vec<MemoryRecord> = records.into_iter().filter(|r| r.is_live(floor)).collect();
    live.sort_by(compare);
    live.truncate(limit);
    live
}
