//! Emotion signal produced per utterance.

use serde::{Deserialize, Serialize};

/// Label used when no classifier answer is available.
pub const NEUTRAL_LABEL: &str = "neutral";

/// Confidence paired with [`NEUTRAL_LABEL`].
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// A classifier's verdict on one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSignal {
    /// Affect label, e.g. "intense" or "neutral".
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl EmotionSignal {
    /// Build a signal, clamping confidence to [0, 1].
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The fallback signal.
    #[must_use]
    pub fn neutral() -> Self {
        Self::new(NEUTRAL_LABEL, NEUTRAL_CONFIDENCE)
    }

    /// Whether this is the fallback signal.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.label == NEUTRAL_LABEL
    }
}

impl Default for EmotionSignal {
    fn default() -> Self {
        Self::neutral()
    }
}
