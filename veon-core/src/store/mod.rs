//! Memory store boundary.
//!
//! The retention core only needs a record-oriented store with CRUD
//! semantics. [`MemoryStore`] is that boundary; [`SqliteStore`] persists to a
//! SQLite file and [`InMemoryStore`] keeps everything in a map (tests,
//! embedding, ephemeral sessions).
//!
//! Strength writes can be made conditional with
//! [`MemoryUpdate::expecting`]: the write only lands if the stored strength
//! still equals the value the writer read, otherwise the store reports
//! [`VeonError::Conflict`](crate::error::VeonError::Conflict). This is how
//! concurrent decay passes avoid lost updates without a global lock.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{MemoryId, MemoryRecord, NewMemory};

/// CRUD boundary to persistent storage.
pub trait MemoryStore: Send + Sync {
    /// Persist a new record and return its store-assigned id.
    ///
    /// # Errors
    /// Storage failures.
    fn create(&self, memory: NewMemory) -> Result<MemoryId>;

    /// All records matching `filter`, oldest first.
    ///
    /// # Errors
    /// Storage failures.
    fn get_all(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>>;

    /// A single record, or `None` if it does not exist.
    ///
    /// # Errors
    /// Storage failures.
    fn get_by_id(&self, id: MemoryId) -> Result<Option<MemoryRecord>>;

    /// Apply `update` to one record.
    ///
    /// # Errors
    /// `NotFound` if the record does not exist, `Conflict` if
    /// `update.expected_strength` is set and no longer matches, or storage
    /// failures.
    fn update(&self, id: MemoryId, update: &MemoryUpdate) -> Result<()>;

    /// Delete every record matching `filter` and return how many went.
    ///
    /// # Errors
    /// Storage failures.
    fn delete(&self, filter: &MemoryFilter) -> Result<usize>;
}

impl<S: MemoryStore + ?Sized> MemoryStore for Arc<S> {
    fn create(&self, memory: NewMemory) -> Result<MemoryId> {
        (**self).create(memory)
    }

    fn get_all(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>> {
        (**self).get_all(filter)
    }

    fn get_by_id(&self, id: MemoryId) -> Result<Option<MemoryRecord>> {
        (**self).get_by_id(id)
    }

    fn update(&self, id: MemoryId, update: &MemoryUpdate) -> Result<()> {
        (**self).update(id, update)
    }

    fn delete(&self, filter: &MemoryFilter) -> Result<usize> {
        (**self).delete(filter)
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Record predicate for reads and deletes.
///
/// All fields are optional; unset fields do not filter. Set fields combine
/// with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryFilter {
    /// Exactly this record.
    pub id: Option<MemoryId>,
    /// Strength strictly greater than this.
    pub strength_above: Option<f64>,
    /// Strength strictly less than this.
    pub strength_below: Option<f64>,
}

impl MemoryFilter {
    /// Match everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match one record.
    #[must_use]
    pub fn by_id(id: MemoryId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Records eligible for retrieval (`strength > floor`).
    #[must_use]
    pub fn live(floor: f64) -> Self {
        Self::default().with_strength_above(floor)
    }

    /// Records eligible for pruning (`strength < floor`).
    #[must_use]
    pub fn prunable(floor: f64) -> Self {
        Self::default().with_strength_below(floor)
    }

    /// Records the decay pass still has work to do on (`strength > 0`).
    #[must_use]
    pub fn decaying() -> Self {
        Self::default().with_strength_above(0.0)
    }

    /// Require `strength > threshold`.
    #[must_use]
    pub fn with_strength_above(mut self, threshold: f64) -> Self {
        self.strength_above = Some(threshold);
        self
    }

    /// Require `strength < threshold`.
    #[must_use]
    pub fn with_strength_below(mut self, threshold: f64) -> Self {
        self.strength_below = Some(threshold);
        self
    }

    /// Evaluate the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        if self.id.is_some_and(|id| id != record.id) {
            return false;
        }
        if self.strength_above.is_some_and(|t| record.strength <= t) {
            return false;
        }
        if self.strength_below.is_some_and(|t| record.strength >= t) {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Field updates
// ---------------------------------------------------------------------------

/// Field changes for a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUpdate {
    /// New strength.
    pub strength: Option<f64>,
    /// New `last_accessed` anchor.
    pub last_accessed: Option<DateTime<Utc>>,
    /// Only apply if the stored strength equals this value.
    pub expected_strength: Option<f64>,
}

impl MemoryUpdate {
    /// Write a new strength.
    #[must_use]
    pub fn strength(strength: f64) -> Self {
        Self {
            strength: Some(strength),
            ..Self::default()
        }
    }

    /// Also move the `last_accessed` anchor.
    #[must_use]
    pub fn touched_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = Some(at);
        self
    }

    /// Make the write conditional on the strength that was read.
    #[must_use]
    pub fn expecting(mut self, strength: f64) -> Self {
        self.expected_strength = Some(strength);
        self
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strength.is_none() && self.last_accessed.is_none()
    }

    /// Apply the field changes to an in-memory record.
    pub fn apply_to(&self, record: &mut MemoryRecord) {
        if let Some(strength) = self.strength {
            record.strength = strength;
        }
        if let Some(at) = self.last_accessed {
            record.last_accessed = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(strength: f64) -> MemoryRecord {
        let mut r = NewMemory::new("filter me", None, 0.5, Utc::now()).into_record(MemoryId::new());
        r.strength = strength;
        r
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(MemoryFilter::all().matches(&record(0.0)));
        assert!(MemoryFilter::all().matches(&record(1.0)));
    }

    #[test]
    fn live_and_prunable_are_strict() {
        assert!(MemoryFilter::live(0.1).matches(&record(0.11)));
        assert!(!MemoryFilter::live(0.1).matches(&record(0.1)));
        assert!(MemoryFilter::prunable(0.1).matches(&record(0.09)));
        assert!(!MemoryFilter::prunable(0.1).matches(&record(0.1)));
    }

    #[test]
    fn decaying_excludes_exhausted_records() {
        assert!(!MemoryFilter::decaying().matches(&record(0.0)));
        assert!(MemoryFilter::decaying().matches(&record(1e-9)));
    }

    #[test]
    fn id_filter_combines_with_strength() {
        let r = record(0.5);
        assert!(MemoryFilter::by_id(r.id).matches(&r));
        assert!(!MemoryFilter::by_id(r.id).with_strength_below(0.1).matches(&r));
        assert!(!MemoryFilter::by_id(MemoryId::new()).matches(&r));
    }

    #[test]
    fn update_applies_fields() {
        let mut r = record(0.9);
        let at = r.last_accessed + chrono::Duration::hours(2);
        MemoryUpdate::strength(0.4).touched_at(at).apply_to(&mut r);
        assert!((r.strength - 0.4).abs() < f64::EPSILON);
        assert_eq!(r.last_accessed, at);
        assert!(MemoryUpdate::default().is_empty());
    }
}
