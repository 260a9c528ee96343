//! Pruning sweeper.
//!
//! Deletes every record whose stored strength has fallen strictly below the
//! floor. The sweeper never decays anything itself; it trusts whatever the
//! last decay pass wrote. Pruning is terminal: a deleted id never comes back.
//!
//! Records are deleted one at a time so that a failure part-way through can
//! report exactly how many deletions already landed. Those are not rolled
//! back.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::{Result, VeonError};
use crate::store::{MemoryFilter, MemoryStore};
use crate::types::MemoryId;

/// Outcome of a successful sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Records removed, in the order they were deleted.
    pub pruned: Vec<MemoryId>,
}

impl PruneReport {
    /// Number of records deleted.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.pruned.len()
    }
}

/// Delete every record with `strength < floor`.
///
/// Running it twice with no decay in between deletes nothing the second time.
///
/// # Errors
///
/// A listing failure is returned as-is. A failure while deleting returns
/// [`VeonError::PruneIncomplete`] carrying the count already deleted.
pub fn prune_weak<S: MemoryStore + ?Sized>(store: &S, floor: f64) -> Result<PruneReport> {
    let start = Instant::now();
    let candidates = store.get_all(&MemoryFilter::prunable(floor))?;
    let mut report = PruneReport::default();

    for record in candidates {
        // Re-check the predicate at delete time: a concurrent writer may have
        // touched the record since it was listed.
        let filter = MemoryFilter::by_id(record.id).with_strength_below(floor);
        match store.delete(&filter) {
            Ok(0) => {}
            Ok(_) => report.pruned.push(record.id),
            Err(source) => {
                warn!(
                    memory = %record.id,
                    deleted = report.deleted(),
                    error = %source,
                    "Prune sweep stopped"
                );
                return Err(VeonError::PruneIncomplete {
                    deleted: report.deleted(),
                    source: Box::new(source),
                });
            }
        }
    }

    info!(
        deleted = report.deleted(),
        floor,
        elapsed_us = start.elapsed().as_micros(),
        "Prune sweep complete"
    );
    Ok(report)
}
