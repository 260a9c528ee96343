//! Emotion classifiers.
//!
//! ```text
//! score = Σ tier hits × tier weight        (high 0.30, medium 0.15, low 0.05)
//!       + min(0.10 × '!', 0.30)
//!       + min(0.05 × '?', 0.15)
//!       + min(0.20 × capitals ratio, 0.20)
//! confidence = clamp(score, 0.1, 1.0)
//! ```
//!
//! Transient chatter (the time, the weather, what someone is doing right now)
//! short-circuits to confidence 0 so it is forgotten within hours.

use tracing::{debug, warn};

use crate::error::{Result, SignalError};
use crate::types::EmotionSignal;

/// Anything that can score an utterance for emotional salience.
pub trait EmotionClassifier: Send + Sync {
    /// Classify one utterance.
    ///
    /// # Errors
    /// Implementation-defined; callers normally go through
    /// [`classify_or_neutral`].
    fn classify(&self, text: &str) -> Result<EmotionSignal>;
}

impl<T: EmotionClassifier + ?Sized> EmotionClassifier for std::sync::Arc<T> {
    fn classify(&self, text: &str) -> Result<EmotionSignal> {
        (**self).classify(text)
    }
}

/// Classify `text`, falling back to the neutral signal on any failure or on
/// a non-finite confidence.
pub fn classify_or_neutral<C: EmotionClassifier + ?Sized>(classifier: &C, text: &str) -> EmotionSignal {
    match classifier.classify(text) {
        Ok(signal) if signal.confidence.is_finite() => signal,
        Ok(signal) => {
            warn!(label = %signal.label, "Classifier returned non-finite confidence, using neutral");
            EmotionSignal::neutral()
        }
        Err(e) => {
            warn!(error = %e, "Classifier failed, using neutral");
            EmotionSignal::neutral()
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword tiers
// ---------------------------------------------------------------------------

const HIGH_WEIGHT: f64 = 0.3;
const MEDIUM_WEIGHT: f64 = 0.15;
const LOW_WEIGHT: f64 = 0.05;

const MIN_CONFIDENCE: f64 = 0.1;

/// Life events, extreme emotions and close family.
const HIGH_KEYWORDS: &[&str] = &[
    "accident", "crash", "hospital", "surgery", "died", "death", "funeral", "cancer",
    "disease", "illness", "injury", "hurt", "pain", "emergency",
    "married", "wedding", "divorce", "born", "baby", "pregnant", "graduation",
    "promoted", "fired", "job", "new job", "moved", "moving",
    "love", "hate", "devastated", "heartbroken", "betrayed", "betrayal",
    "trauma", "traumatic", "terrified", "scared", "fear", "nightmare",
    "mom", "dad", "mother", "father", "parent", "child", "son", "daughter",
    "family", "grandma", "grandpa", "brother", "sister",
    "miracle", "amazing", "terrible", "worst", "best", "ever", "never forget",
    "proposal", "engaged", "broke up", "breakup", "cheated", "lost", "found",
];

/// Everyday feelings, relationships and plans.
const MEDIUM_KEYWORDS: &[&str] = &[
    "happy", "sad", "angry", "upset", "excited", "nervous", "worried", "anxious",
    "stressed", "relieved", "proud", "disappointed", "frustrated", "jealous",
    "friend", "girlfriend", "boyfriend", "partner", "colleague", "boss",
    "date", "dating", "relationship", "crush",
    "birthday", "anniversary", "celebration", "party", "trip", "vacation",
    "exam", "test", "interview", "meeting", "project",
    "like", "dislike", "enjoy", "prefer", "hope", "wish", "dream", "plan",
    "miss", "remember", "forget",
];

/// Small talk and daily routine.
const LOW_KEYWORDS: &[&str] = &[
    "okay", "fine", "alright", "good", "nice", "cool", "sure", "yeah",
    "maybe", "sometimes", "usually", "often", "rarely", "occasionally",
    "ate", "eat", "breakfast", "lunch", "dinner", "food", "coffee", "tea",
    "sleep", "slept", "woke", "shower", "walk", "run", "gym", "exercise",
    "watch", "watched", "movie", "show", "game", "read", "book",
    "work", "working", "study", "studying", "homework",
];

/// Status chatter that is only true for a moment.
const TRANSIENT_KEYWORDS: &[&str] = &[
    "time", "what time", "what's the time", "clock", "hour", "minute",
    "weather", "what's the weather", "temperature", "raining", "sunny",
    "right now", "currently", "at the moment", "this second", "this minute",
    "online", "offline", "available", "busy", "free right now",
    "where are you", "what are you doing", "doing right now",
];

/// Rule-based classifier over fixed keyword tiers.
///
/// Keywords match on whole words, so "sometimes" does not count as "time".
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

/// Label for transient chatter.
pub const TRANSIENT_LABEL: &str = "transient";

impl KeywordClassifier {
    /// Create the classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether `text` is momentary status chatter.
    #[must_use]
    pub fn is_transient(text: &str) -> bool {
        let words = normalize(text);
        TRANSIENT_KEYWORDS.iter().any(|k| contains_phrase(&words, k))
    }
}

impl EmotionClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<EmotionSignal> {
        if text.trim().is_empty() {
            return Err(SignalError::EmptyInput);
        }
        if Self::is_transient(text) {
            debug!("Transient utterance");
            return Ok(EmotionSignal::new(TRANSIENT_LABEL, 0.0));
        }

        let words = normalize(text);
        let hits = TierHits::count(&words);
        let confidence = (hits.weighted() + punctuation_boost(text)).clamp(MIN_CONFIDENCE, 1.0);
        let label = hits.dominant_label();
        debug!(label, confidence, high = hits.high, medium = hits.medium, low = hits.low, "Keyword classification");
        Ok(EmotionSignal::new(label, confidence))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TierHits {
    high: usize,
    medium: usize,
    low: usize,
}

impl TierHits {
    fn count(words: &str) -> Self {
        let hits = |list: &[&str]| list.iter().filter(|k| contains_phrase(words, k)).count();
        Self {
            high: hits(HIGH_KEYWORDS),
            medium: hits(MEDIUM_KEYWORDS),
            low: hits(LOW_KEYWORDS),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn weighted(self) -> f64 {
        self.high as f64 * HIGH_WEIGHT + self.medium as f64 * MEDIUM_WEIGHT + self.low as f64 * LOW_WEIGHT
    }

    /// Tier contributing the most weight; ties go to the higher tier.
    #[allow(clippy::cast_precision_loss)]
    fn dominant_label(self) -> &'static str {
        let high = self.high as f64 * HIGH_WEIGHT;
        let medium = self.medium as f64 * MEDIUM_WEIGHT;
        let low = self.low as f64 * LOW_WEIGHT;
        if self.high + self.medium + self.low == 0 {
            "calm"
        } else if high >= medium && high >= low {
            "intense"
        } else if medium >= low {
            "moderate"
        } else {
            "mild"
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn punctuation_boost(text: &str) -> f64 {
    let exclamations = text.matches('!').count() as f64;
    let questions = text.matches('?').count() as f64;
    let total = text.chars().count().max(1) as f64;
    let capitals = text.chars().filter(|c| c.is_uppercase()).count() as f64;

    (exclamations * 0.1).min(0.3) + (questions * 0.05).min(0.15) + (capitals / total * 0.2).min(0.2)
}

/// Lowercase, collapse everything except letters, digits and apostrophes to
/// single spaces, and pad both ends with a space.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '\'' {
            out.push(c);
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    if !out.ends_with(' ') {
        out.push(' ');
    }
    out
}

fn contains_phrase(words: &str, phrase: &str) -> bool {
    words.contains(&format!(" {phrase} "))
}
