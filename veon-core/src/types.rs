//! Core type definitions for the VEON memory retention system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decay;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for a memory record. Assigned by the store on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A remembered utterance and its retention state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Store-assigned identifier.
    pub id: MemoryId,
    /// The remembered utterance.
    pub content: String,
    /// Affect label from the classifier, if any.
    pub emotion_tag: Option<String>,
    /// Salience in [0, 1].
    pub importance: f64,
    /// Per-hour exponential decay constant, fixed at creation.
    pub decay_rate: f64,
    /// Current retention in [0, 1]. Starts at 1.0 and only goes down.
    pub strength: f64,
    /// When the memory was formed.
    pub created_at: DateTime<Utc>,
    /// Anchor for elapsed-time computation. Moved only by recall.
    pub last_accessed: DateTime<Utc>,
}

impl MemoryRecord {
    /// Strictly above the floor: eligible for retrieval.
    #[must_use]
    pub fn is_live(&self, floor: f64) -> bool {
        self.strength > floor
    }

    /// Strictly below the floor: eligible for pruning.
    #[must_use]
    pub fn is_prunable(&self, floor: f64) -> bool {
        self.strength < floor
    }

    /// Strength this record would have at `now` if decayed from its anchor.
    #[must_use]
    pub fn strength_at(&self, now: DateTime<Utc>) -> f64 {
        let hours = decay::elapsed_hours(self.last_accessed, now);
        decay::decayed_strength(self.strength, self.decay_rate, hours)
    }
}

/// A record that has not been persisted yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    /// The remembered utterance.
    pub content: String,
    /// Affect label.
    pub emotion_tag: Option<String>,
    /// Salience in [0, 1].
    pub importance: f64,
    /// Derived from `importance` via [`decay::decay_rate_for`].
    pub decay_rate: f64,
    /// Initial strength (always 1.0 from the engine).
    pub strength: f64,
    /// Creation time; also the initial `last_accessed`.
    pub created_at: DateTime<Utc>,
}

impl NewMemory {
    /// Build a fresh memory at full strength with its decay rate derived
    /// from `importance`.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        emotion_tag: Option<String>,
        importance: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let importance = if importance.is_nan() {
            0.0
        } else {
            importance.clamp(0.0, 1.0)
        };
        Self {
            content: content.into(),
            emotion_tag,
            importance,
            decay_rate: decay::decay_rate_for(importance),
            strength: 1.0,
            created_at,
        }
    }

    /// Attach the store-assigned id.
    #[must_use]
    pub fn into_record(self, id: MemoryId) -> MemoryRecord {
        MemoryRecord {
            id,
            content: self.content,
            emotion_tag: self.emotion_tag,
            importance: self.importance,
            decay_rate: self.decay_rate,
            strength: self.strength,
            created_at: self.created_at,
            last_accessed: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Snapshot of the memory set at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    /// All stored records.
    pub total: usize,
    /// Records above the floor.
    pub live: usize,
    /// Records below the floor, awaiting a sweep.
    pub prunable: usize,
    /// Mean stored strength (0.0 when empty).
    pub mean_strength: f64,
}

impl MemoryStats {
    /// Summarise a set of records against `floor`.
    #[must_use]
    pub fn from_records(records: &[MemoryRecord], floor: f64) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let live = records.iter().filter(|r| r.is_live(floor)).count();
        let prunable = records.iter().filter(|r| r.is_prunable(floor)).count();
        let sum: f64 = records.iter().map(|r| r.strength).sum();
        Self {
            total: records.len(),
            live,
            prunable,
            mean_strength: sum / records.len() as f64,
        }
    }
}
