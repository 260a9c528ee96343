//! # veon-signal: Emotion Signal Sources for VEON
//!
//! Every utterance is scored for emotional salience before it is remembered.
//! The score comes from an [`EmotionClassifier`]:
//!   - **`KeywordClassifier`**: offline, rule-based, always available
//!   - any remote model, behind the same trait
//!
//! Classification never blocks memory formation: [`classify_or_neutral`]
//! swaps any failure for the neutral signal (confidence 0.5).

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod error;
pub mod types;

pub use classifier::{EmotionClassifier, KeywordClassifier, TRANSIENT_LABEL, classify_or_neutral};
pub use error::SignalError;
pub use types::EmotionSignal;
