//! Global decay pass.
//!
//! Runs once per triggering event (one conversational turn), never on a
//! timer. Every record with `strength > 0` is decayed from its own
//! `last_accessed` anchor to `now` and written back. The anchor itself is not
//! moved; only recall does that.
//!
//! Each record is written independently. A failed write is recorded in the
//! [`DecayReport`] and the pass moves on, so one bad row never blocks the
//! rest of the set.
//!
//! Writes are conditional on the strength that was read. When two passes race
//! on the same record the loser sees `Conflict`, re-reads the record and
//! recomputes from the fresh value, up to `max_attempts` times.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, VeonError};
use crate::store::{MemoryFilter, MemoryStore, MemoryUpdate};
use crate::types::{MemoryId, MemoryRecord};

/// A record the pass could not update.
#[derive(Debug)]
pub struct DecayFailure {
    /// Which record.
    pub id: MemoryId,
    /// Why the write failed.
    pub error: VeonError,
}

/// Outcome of one global decay pass.
#[derive(Debug, Default)]
pub struct DecayReport {
    /// Records whose new strength was persisted.
    pub updated: Vec<MemoryId>,
    /// Records whose update failed. Their stored strength is stale.
    pub failures: Vec<DecayFailure>,
    /// Conditional writes that lost a race and were retried.
    pub conflicts_retried: u32,
}

impl DecayReport {
    /// Number of records successfully decayed.
    #[must_use]
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    /// Number of records that could not be decayed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether every record was written.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decay every record with positive strength to `now`.
///
/// `max_attempts` bounds the conditional-write attempts per record (minimum 1).
///
/// # Errors
///
/// Only the initial listing can fail the pass as a whole. Per-record failures
/// are reported in [`DecayReport::failures`].
pub fn apply_global_decay<S: MemoryStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<DecayReport> {
    let start = Instant::now();
    let records = store.get_all(&MemoryFilter::decaying())?;
    let examined = records.len();
    let mut report = DecayReport::default();

    for record in records {
        let id = record.id;
        match decay_record(store, record, now, max_attempts.max(1)) {
            Ok((strength, retries)) => {
                report.conflicts_retried += retries;
                debug!(memory = %id, strength, "Decayed memory");
                report.updated.push(id);
            }
            Err((error, retries)) => {
                report.conflicts_retried += retries;
                warn!(memory = %id, error = %error, "Failed to persist decayed strength");
                report.failures.push(DecayFailure { id, error });
            }
        }
    }

    info!(
        examined,
        updated = report.updated_count(),
        failed = report.failed_count(),
        conflicts_retried = report.conflicts_retried,
        elapsed_us = start.elapsed().as_micros(),
        "Global decay pass complete"
    );

    Ok(report)
}

/// Decay one record with optimistic retries. Returns the written strength
/// and how many conflicts were retried.
fn decay_record<S: MemoryStore + ?Sized>(
    store: &S,
    mut record: MemoryRecord,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> std::result::Result<(f64, u32), (VeonError, u32)> {
    let mut retries = 0;
    loop {
        let strength = record.strength_at(now);
        let update = MemoryUpdate::strength(strength).expecting(record.strength);

        match store.update(record.id, &update) {
            Ok(()) => return Ok((strength, retries)),
            Err(VeonError::Conflict(id)) if retries + 1 < max_attempts => {
                retries += 1;
                record = match store.get_by_id(id) {
                    Ok(Some(fresh)) => fresh,
                    Ok(None) => return Err((VeonError::NotFound(id), retries)),
                    Err(e) => return Err((e, retries)),
                };
            }
            Err(e) => return Err((e, retries)),
        }
    }
}
