//! Importance scoring.
//!
//! The classifier collaborator reports how confident it is about the affect of
//! an utterance. Strongly emotional utterances are treated as more salient:
//!
//! ```text
//! importance = min(1.0, clamp(confidence, 0, 1) × multiplier)
//! ```
//!
//! with `multiplier` defaulting to [`DEFAULT_IMPORTANCE_MULTIPLIER`].

use crate::error::{Result, VeonError};

/// Default confidence → importance multiplier.
pub const DEFAULT_IMPORTANCE_MULTIPLIER: f64 = 1.5;

/// Importance for a classifier confidence using the default multiplier.
///
/// # Errors
/// Returns [`VeonError::Validation`] if `confidence` is NaN.
pub fn importance_from_confidence(confidence: f64) -> Result<f64> {
    scaled_importance(confidence, DEFAULT_IMPORTANCE_MULTIPLIER)
}

/// Importance for a classifier confidence with an explicit multiplier.
///
/// Out-of-range confidence is clamped to [0, 1]; the result is always in
/// [0, 1].
///
/// # Errors
/// Returns [`VeonError::Validation`] if `confidence` is NaN or `multiplier`
/// is not finite.
pub fn scaled_importance(confidence: f64, multiplier: f64) -> Result<f64> {
    if confidence.is_nan() {
        return Err(VeonError::Validation("confidence is NaN".into()));
    }
    if !multiplier.is_finite() {
        return Err(VeonError::Validation(format!(
            "importance multiplier must be finite, got {multiplier}"
        )));
    }
    let c = confidence.clamp(0.0, 1.0);
    Ok((c * multiplier.max(0.0)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_and_caps() {
        assert!((importance_from_confidence(0.4).expect("valid") - 0.6).abs() < 1e-12);
        assert!((importance_from_confidence(0.9).expect("valid") - 1.0).abs() < 1e-12);
        assert!(importance_from_confidence(0.0).expect("valid").abs() < 1e-12);
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        assert!((importance_from_confidence(7.0).expect("valid") - 1.0).abs() < 1e-12);
        assert!(importance_from_confidence(-1.0).expect("valid").abs() < 1e-12);
        assert!((importance_from_confidence(f64::INFINITY).expect("valid") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_nan() {
        assert!(matches!(
            importance_from_confidence(f64::NAN),
            Err(VeonError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_finite_multiplier() {
        for multiplier in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                scaled_importance(0.0, multiplier),
                Err(VeonError::Validation(_))
            ));
        }
    }

    #[test]
    fn custom_multiplier() {
        assert!((scaled_importance(0.5, 1.0).expect("valid") - 0.5).abs() < 1e-12);
        assert!((scaled_importance(0.5, 3.0).expect("valid") - 1.0).abs() < 1e-12);
    }
}
