//! Memory engine facade.
//!
//! Owns the injected store handle, the clock and the retention config, and
//! exposes the operations the chat orchestrator drives once per turn. The
//! engine holds no record state of its own: every call goes to the store.

use std::sync::atomic::Ordering;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::MemoryConfig;
use crate::coordinator::{self, DecayReport};
use crate::error::{Result, VeonError};
use crate::importance;
use crate::metrics::VeonCounters;
use crate::pruning::{self, PruneReport};
use crate::retrieval::RetrievalEngine;
use crate::store::{MemoryFilter, MemoryStore, MemoryUpdate};
use crate::types::{MemoryId, MemoryRecord, MemoryStats, NewMemory};

/// The retention subsystem behind one store.
#[derive(Debug)]
pub struct MemoryEngine<S: MemoryStore, C: Clock> {
    store: S,
    clock: C,
    config: MemoryConfig,
    retrieval: RetrievalEngine,
    counters: VeonCounters,
}

impl<S: MemoryStore, C: Clock> MemoryEngine<S, C> {
    /// Build an engine over `store` using `clock` for every timestamp.
    ///
    /// # Errors
    /// [`VeonError::Config`] if `config` fails [`MemoryConfig::validate`].
    pub fn new(store: S, clock: C, config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        let retrieval = RetrievalEngine::new(config.floor);
        Ok(Self {
            store,
            clock,
            config,
            retrieval,
            counters: VeonCounters::new(),
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Active retention config.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Process-lifetime counters.
    pub fn counters(&self) -> &VeonCounters {
        &self.counters
    }

    /// Importance for a classifier confidence using the configured multiplier.
    ///
    /// # Errors
    /// [`VeonError::Validation`] if `confidence` is NaN.
    pub fn importance_for(&self, confidence: f64) -> Result<f64> {
        importance::scaled_importance(confidence, self.config.importance_multiplier)
            .inspect_err(|_| self.reject())
    }

    /// Persist a new memory at full strength, timestamped now.
    ///
    /// # Errors
    /// [`VeonError::Validation`] for empty or oversized content or a NaN
    /// importance, checked before the store is touched. Store failures
    /// propagate unchanged.
    pub fn add_memory(
        &self,
        content: &str,
        emotion_label: Option<&str>,
        importance: f64,
    ) -> Result<MemoryId> {
        if content.trim().is_empty() {
            self.reject();
            return Err(VeonError::Validation("memory content is empty".into()));
        }
        let chars = content.chars().count();
        if chars > self.config.max_content_chars {
            self.reject();
            return Err(VeonError::Validation(format!(
                "memory content is {chars} characters, limit is {}",
                self.config.max_content_chars
            )));
        }
        if importance.is_nan() {
            self.reject();
            return Err(VeonError::Validation("importance is NaN".into()));
        }

        let memory = NewMemory::new(
            content,
            emotion_label.map(str::to_owned),
            importance,
            self.clock.now(),
        );
        let decay_rate = memory.decay_rate;
        let id = self.store.create(memory)?;
        VeonCounters::add(&self.counters.memories_created, 1);
        debug!(memory = %id, importance, decay_rate, "Memory created");
        Ok(id)
    }

    /// Decay every record to now.
    ///
    /// # Errors
    /// Only a failure to list records. Per-record failures land in the report.
    pub fn apply_global_decay(&self) -> Result<DecayReport> {
        let report = coordinator::apply_global_decay(
            &self.store,
            self.clock.now(),
            self.config.max_update_retries,
        )?;

        self.counters.decay_passes.fetch_add(1, Ordering::Relaxed);
        VeonCounters::add(&self.counters.records_decayed, report.updated_count() as u64);
        VeonCounters::add(&self.counters.decay_failures, report.failed_count() as u64);
        VeonCounters::add(&self.counters.write_conflicts, u64::from(report.conflicts_retried));
        Ok(report)
    }

    /// Top `limit` live records rendered as generation context.
    ///
    /// # Errors
    /// Store failures while listing records.
    pub fn ranked_context(&self, limit: usize) -> Result<String> {
        self.retrieval.context(&self.store, limit)
    }

    /// Top `limit` live records for display, best first.
    ///
    /// # Errors
    /// Store failures while listing records.
    pub fn recent_memories(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        self.retrieval.rank(&self.store, limit)
    }

    /// Delete every record below the floor.
    ///
    /// # Errors
    /// See [`pruning::prune_weak`].
    pub fn prune_weak(&self) -> Result<PruneReport> {
        match pruning::prune_weak(&self.store, self.config.floor) {
            Ok(report) => {
                VeonCounters::add(&self.counters.records_pruned, report.deleted() as u64);
                Ok(report)
            }
            Err(e) => {
                if let VeonError::PruneIncomplete { deleted, .. } = &e {
                    VeonCounters::add(&self.counters.records_pruned, *deleted as u64);
                }
                Err(e)
            }
        }
    }

    /// Touch one record: decay it to now and move its anchor to now.
    ///
    /// Returns the record as persisted.
    ///
    /// # Errors
    /// [`VeonError::NotFound`] if the id does not exist (or vanished while
    /// retrying). Other store failures propagate.
    pub fn recall(&self, id: MemoryId) -> Result<MemoryRecord> {
        let attempts = self.config.max_update_retries.max(1);
        let mut record = self.store.get_by_id(id)?.ok_or(VeonError::NotFound(id))?;
        let mut attempt = 1;

        loop {
            let now = self.clock.now();
            let update = MemoryUpdate::strength(record.strength_at(now))
                .touched_at(now)
                .expecting(record.strength);

            match self.store.update(id, &update) {
                Ok(()) => {
                    update.apply_to(&mut record);
                    self.counters.recalls.fetch_add(1, Ordering::Relaxed);
                    debug!(memory = %id, strength = record.strength, "Memory recalled");
                    return Ok(record);
                }
                Err(VeonError::Conflict(_)) if attempt < attempts => {
                    attempt += 1;
                    self.counters.write_conflicts.fetch_add(1, Ordering::Relaxed);
                    record = self.store.get_by_id(id)?.ok_or(VeonError::NotFound(id))?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delete one record.
    ///
    /// # Errors
    /// [`VeonError::NotFound`] if nothing was deleted.
    pub fn forget(&self, id: MemoryId) -> Result<()> {
        match self.store.delete(&MemoryFilter::by_id(id))? {
            0 => Err(VeonError::NotFound(id)),
            _ => {
                info!(memory = %id, "Memory forgotten");
                Ok(())
            }
        }
    }

    /// Delete every record. Returns how many were removed.
    ///
    /// # Errors
    /// Store failures.
    pub fn clear(&self) -> Result<usize> {
        let deleted = self.store.delete(&MemoryFilter::all())?;
        info!(deleted, "All memories cleared");
        Ok(deleted)
    }

    /// Counts and mean strength over the whole store.
    ///
    /// # Errors
    /// Store failures while listing records.
    pub fn stats(&self) -> Result<MemoryStats> {
        let records = self.store.get_all(&MemoryFilter::all())?;
        Ok(MemoryStats::from_records(&records, self.config.floor))
    }

    fn reject(&self) {
        self.counters.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::InMemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn engine() -> (MemoryEngine<InMemoryStore, Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = MemoryEngine::new(InMemoryStore::new(), Arc::clone(&clock), MemoryConfig::default())
            .expect("engine");
        (engine, clock)
    }

    #[test]
    fn rejects_unbounded_multiplier() {
        let config = MemoryConfig {
            importance_multiplier: f64::INFINITY,
            ..MemoryConfig::default()
        };
        let err = MemoryEngine::new(InMemoryStore::new(), ManualClock::default(), config).expect_err("invalid");
        assert!(matches!(err, VeonError::Config(_)));
    }

    #[test]
    fn zero_confidence_scores_zero_importance() {
        let (engine, _) = engine();
        assert!(engine.importance_for(0.0).expect("valid").abs() < f64::EPSILON);
        assert!((engine.importance_for(1.0).expect("valid") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn add_memory_validates_before_writing() {
        let (engine, _) = engine();
        assert!(matches!(engine.add_memory("   ", None, 0.5), Err(VeonError::Validation(_))));
        assert!(matches!(engine.add_memory("hi", None, f64::NAN), Err(VeonError::Validation(_))));
        let long = "x".repeat(engine.config().max_content_chars + 1);
        assert!(matches!(engine.add_memory(&long, None, 0.5), Err(VeonError::Validation(_))));

        assert!(engine.store().is_empty());
        assert_eq!(engine.counters().snapshot().validation_rejections, 3);
    }

    #[test]
    fn add_memory_stores_full_strength_record() {
        let (engine, _) = engine();
        let id = engine.add_memory("I got the job!", Some("joy"), 0.9).expect("add");
        let record = engine.store().get_by_id(id).expect("get").expect("Some");
        assert!((record.strength - 1.0).abs() < f64::EPSILON);
        assert_eq!(record.emotion_tag.as_deref(), Some("joy"));
        assert_eq!(engine.counters().snapshot().memories_created, 1);
    }

    #[test]
    fn recall_moves_anchor_and_decays() {
        let (engine, clock) = engine();
        let id = engine.add_memory("my sister's wedding", None, 0.5).expect("add");
        clock.advance_hours(10.0);

        let recalled = engine.recall(id).expect("recall");
        assert_eq!(recalled.last_accessed, clock.now());
        assert!((recalled.strength - (-1.0_f64).exp()).abs() < 1e-9);

        // Anchor moved: an immediate pass changes nothing.
        engine.apply_global_decay().expect("decay");
        let stored = engine.store().get_by_id(id).expect("get").expect("Some");
        assert!((stored.strength - recalled.strength).abs() < 1e-12);
    }

    #[test]
    fn recall_and_forget_missing_are_not_found() {
        let (engine, _) = engine();
        let ghost = MemoryId::new();
        assert!(matches!(engine.recall(ghost), Err(VeonError::NotFound(_))));
        assert!(matches!(engine.forget(ghost), Err(VeonError::NotFound(_))));
    }

    #[test]
    fn forget_clear_and_stats() {
        let (engine, _) = engine();
        let a = engine.add_memory("a", None, 0.2).expect("add");
        engine.add_memory("b", None, 0.4).expect("add");
        engine.add_memory("c", None, 0.6).expect("add");

        engine.forget(a).expect("forget");
        let stats = engine.stats().expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.live, 2);

        assert_eq!(engine.clear().expect("clear"), 2);
        assert_eq!(engine.stats().expect("stats"), MemoryStats::default());
    }

    #[test]
    fn prune_counts_deletions() {
        let (engine, clock) = engine();
        engine.add_memory("what time is it", None, 0.0).expect("add");
        engine.add_memory("my dog died", None, 1.0).expect("add");

        clock.advance_hours(24.0);
        let report = engine.apply_global_decay().expect("decay");
        assert_eq!(report.updated_count(), 2);
        assert_eq!(engine.prune_weak().expect("prune").deleted(), 1);
        assert_eq!(engine.store().len(), 1);

        let snap = engine.counters().snapshot();
        assert_eq!(snap.records_pruned, 1);
        assert_eq!(snap.decay_passes, 1);
        assert_eq!(snap.records_decayed, 2);
    }
}
