//! Per-turn orchestration.
//!
//! Order within a turn is fixed: the new memory is created first, then every
//! record decays, then retrieval runs. The new record therefore decays over
//! roughly zero elapsed time and enters retrieval at full strength.
//!
//! Decay failures never fail the turn. Records that could not be written keep
//! their stale strength and are still ranked on it.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use veon_core::clock::Clock;
use veon_core::engine::MemoryEngine;
use veon_core::error::VeonError;
use veon_core::store::MemoryStore;
use veon_core::types::{MemoryId, MemoryRecord};
use veon_signal::{EmotionClassifier, EmotionSignal, classify_or_neutral};

use crate::error::Result;

/// Everything the front end needs after one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The memory formed from this turn's utterance.
    pub memory_id: MemoryId,
    /// Classifier verdict (neutral if the classifier failed).
    pub signal: EmotionSignal,
    /// Importance derived from the signal.
    pub importance: f64,
    /// Rendered context for the text-generation collaborator.
    pub context: String,
    /// Ranked records for display.
    pub display: Vec<MemoryRecord>,
    /// Records the decay pass could not persist.
    pub decay_failures: usize,
    /// Records the sweeper deleted this turn.
    pub pruned: usize,
}

impl TurnOutcome {
    /// Encode as a JSON string for the UI.
    ///
    /// # Errors
    /// Serialisation failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Runs conversational turns against a shared engine.
pub struct TurnProcessor<S, C, K>
where
    S: MemoryStore + 'static,
    C: Clock + 'static,
    K: EmotionClassifier + 'static,
{
    engine: Arc<MemoryEngine<S, C>>,
    classifier: Arc<K>,
}

impl<S, C, K> Clone for TurnProcessor<S, C, K>
where
    S: MemoryStore + 'static,
    C: Clock + 'static,
    K: EmotionClassifier + 'static,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<S, C, K> TurnProcessor<S, C, K>
where
    S: MemoryStore + 'static,
    C: Clock + 'static,
    K: EmotionClassifier + 'static,
{
    /// Build a processor over an engine and a classifier.
    pub fn new(engine: MemoryEngine<S, C>, classifier: K) -> Self {
        Self {
            engine: Arc::new(engine),
            classifier: Arc::new(classifier),
        }
    }

    /// The shared engine, for the operations a turn does not cover.
    pub fn engine(&self) -> &Arc<MemoryEngine<S, C>> {
        &self.engine
    }

    /// Process one user utterance.
    ///
    /// # Errors
    /// Validation or store failures from memory creation and retrieval, or a
    /// failed blocking worker. Decay and prune failures are logged and
    /// counted, not returned.
    pub async fn handle_turn(&self, text: impl Into<String>) -> Result<TurnOutcome> {
        let text = text.into();
        let engine = Arc::clone(&self.engine);
        let classifier = Arc::clone(&self.classifier);

        let outcome = tokio::task::spawn_blocking(move || {
            run_turn(engine.as_ref(), classifier.as_ref(), &text)
        })
        .await??;
        Ok(outcome)
    }
}

fn run_turn<S, C, K>(engine: &MemoryEngine<S, C>, classifier: &K, text: &str) -> veon_core::Result<TurnOutcome>
where
    S: MemoryStore,
    C: Clock,
    K: EmotionClassifier + ?Sized,
{
    let start = Instant::now();
    let config = engine.config();

    let signal = classify_or_neutral(classifier, text);
    let importance = engine.importance_for(signal.confidence)?;
    let memory_id = engine.add_memory(text, Some(&signal.label), importance)?;

    let decay_failures = match engine.apply_global_decay() {
        Ok(report) => {
            for failure in &report.failures {
                warn!(memory = %failure.id, error = %failure.error, "Stale strength after decay");
            }
            report.failed_count()
        }
        Err(e) => {
            warn!(error = %e, "Global decay pass failed");
            0
        }
    };

    let pruned = if config.prune_after_decay {
        match engine.prune_weak() {
            Ok(report) => report.deleted(),
            Err(VeonError::PruneIncomplete { deleted, source }) => {
                warn!(deleted, error = %source, "Prune sweep incomplete");
                deleted
            }
            Err(e) => {
                warn!(error = %e, "Prune sweep failed");
                0
            }
        }
    } else {
        0
    };

    let context = engine.ranked_context(config.context_limit)?;
    let display = engine.recent_memories(config.display_limit)?;

    let shown = display.len();
    info!(
        memory = %memory_id,
        label = %signal.label,
        importance,
        decay_failures,
        pruned,
        shown,
        elapsed_us = start.elapsed().as_micros(),
        "Turn complete"
    );

    Ok(TurnOutcome {
        memory_id,
        signal,
        importance,
        context,
        display,
        decay_failures,
        pruned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use veon_core::clock::ManualClock;
    use veon_core::config::MemoryConfig;
    use veon_core::store::InMemoryStore;
    use veon_signal::{KeywordClassifier, SignalError};

    struct Fixed(f64);

    impl EmotionClassifier for Fixed {
        fn classify(&self, _text: &str) -> veon_signal::error::Result<EmotionSignal> {
            Ok(EmotionSignal::new("fixed", self.0))
        }
    }

    struct Down;

    impl EmotionClassifier for Down {
        fn classify(&self, _text: &str) -> veon_signal::error::Result<EmotionSignal> {
            Err(SignalError::Unavailable("timeout".into()))
        }
    }

    fn engine() -> MemoryEngine<InMemoryStore, ManualClock> {
        MemoryEngine::new(InMemoryStore::new(), ManualClock::default(), MemoryConfig::default()).expect("engine")
    }

    #[test]
    fn new_memory_enters_context_at_full_strength() {
        let outcome = run_turn(&engine(), &Fixed(0.4), "I started painting").expect("turn");
        assert!((outcome.importance - 0.6).abs() < 1e-12);
        assert_eq!(outcome.context, "[Memory: I started painting (strength: 1.00)]");
        assert_eq!(outcome.display.len(), 1);
        assert_eq!(outcome.decay_failures, 0);
    }

    #[test]
    fn classifier_outage_uses_neutral_importance() {
        let outcome = run_turn(&engine(), &Down, "hello there").expect("turn");
        assert!(outcome.signal.is_neutral());
        assert!((outcome.importance - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_utterance_is_rejected_without_writing() {
        let engine = engine();
        let err = run_turn(&engine, &KeywordClassifier, "   ").expect_err("empty");
        assert!(matches!(err, VeonError::Validation(_)));
        assert!(engine.store().is_empty());
    }
}
