//! Runtime counters.
//!
//! Lock-free `AtomicU64` counters bumped on the hot path by the engine and read
//! on export. Values are process-lifetime totals; nothing is persisted.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for memory lifecycle events.
#[derive(Debug)]
pub struct VeonCounters {
    /// Memories created.
    pub memories_created: AtomicU64,
    /// Global decay passes completed.
    pub decay_passes: AtomicU64,
    /// Records successfully decayed across all passes.
    pub records_decayed: AtomicU64,
    /// Per-record decay writes that failed.
    pub decay_failures: AtomicU64,
    /// Conditional writes that lost a race and were retried.
    pub write_conflicts: AtomicU64,
    /// Records deleted by the sweeper.
    pub records_pruned: AtomicU64,
    /// Explicit single-record recalls.
    pub recalls: AtomicU64,
    /// Inputs rejected by validation.
    pub validation_rejections: AtomicU64,
}

impl VeonCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memories_created: AtomicU64::new(0),
            decay_passes: AtomicU64::new(0),
            records_decayed: AtomicU64::new(0),
            decay_failures: AtomicU64::new(0),
            write_conflicts: AtomicU64::new(0),
            records_pruned: AtomicU64::new(0),
            recalls: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
        }
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            memories_created: self.memories_created.load(Ordering::Relaxed),
            decay_passes: self.decay_passes.load(Ordering::Relaxed),
            records_decayed: self.records_decayed.load(Ordering::Relaxed),
            decay_failures: self.decay_failures.load(Ordering::Relaxed),
            write_conflicts: self.write_conflicts.load(Ordering::Relaxed),
            records_pruned: self.records_pruned.load(Ordering::Relaxed),
            recalls: self.recalls.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
        }
    }
}

impl Default for VeonCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Memories created.
    pub memories_created: u64,
    /// Decay passes completed.
    pub decay_passes: u64,
    /// Records decayed.
    pub records_decayed: u64,
    /// Failed decay writes.
    pub decay_failures: u64,
    /// Retried write conflicts.
    pub write_conflicts: u64,
    /// Records pruned.
    pub records_pruned: u64,
    /// Recalls.
    pub recalls: u64,
    /// Validation rejections.
    pub validation_rejections: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 8] = [
            ("veon_memories_created_total", "Memories created", self.memories_created),
            ("veon_decay_passes_total", "Global decay passes completed", self.decay_passes),
            ("veon_records_decayed_total", "Records decayed", self.records_decayed),
            ("veon_decay_failures_total", "Decay writes that failed", self.decay_failures),
            ("veon_write_conflicts_total", "Conditional writes retried after a conflict", self.write_conflicts),
            ("veon_records_pruned_total", "Records deleted by the sweeper", self.records_pruned),
            ("veon_recalls_total", "Single-record recalls", self.recalls),
            ("veon_validation_rejections_total", "Inputs rejected by validation", self.validation_rejections),
        ];

        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}
