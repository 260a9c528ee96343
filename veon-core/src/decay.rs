//! Exponential Forgetting: Memory Decay Model
//!
//! Retention is modelled as:
//!   S(t) = S₀ · e^(−λ·t)
//!
//! Where:
//!   S₀ = strength at the anchor time (`last_accessed`)
//!   λ  = per-hour decay rate, derived once from importance
//!   t  = wall-clock hours since the anchor
//!
//! The rate is λ = max(0.01, 0.2 · (1 − importance)), so a trivial remark
//! (importance 0) falls under the 0.1 floor after ln(10)/0.2 ≈ 11.5 hours while
//! a maximally important one (importance 1) takes ≈ 230 hours.
//!
//! Everything here is pure. Decay is computed lazily when a pass or a recall
//! needs it; nothing is scheduled.

use chrono::{DateTime, TimeDelta, Utc};

/// Slowest possible decay (importance 1.0).
pub const MIN_DECAY_RATE: f64 = 0.01;

/// Fastest possible decay (importance 0.0).
pub const MAX_DECAY_RATE: f64 = 0.2;

/// Decay rate λ (per hour) for a given importance.
///
/// Importance is clamped to [0, 1] first; NaN counts as 0.
/// The result is always in [`MIN_DECAY_RATE`, `MAX_DECAY_RATE`].
#[must_use]
pub fn decay_rate_for(importance: f64) -> f64 {
    let importance = if importance.is_nan() {
        0.0
    } else {
        importance.clamp(0.0, 1.0)
    };
    (MAX_DECAY_RATE * (1.0 - importance)).max(MIN_DECAY_RATE)
}

/// Core forgetting curve: S₀ · e^(−λ·t).
///
/// Negative or NaN `elapsed_hours` is clamped to 0, so the curve can never
/// raise strength. The result is clamped to [0, S₀] and never NaN.
#[must_use]
pub fn decayed_strength(strength: f64, decay_rate: f64, elapsed_hours: f64) -> f64 {
    let s0 = if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    };
    let rate = if decay_rate.is_nan() {
        0.0
    } else {
        decay_rate.max(0.0)
    };
    // f64::max discards NaN.
    let hours = elapsed_hours.max(0.0);

    let s = s0 * (-rate * hours).exp();
    if s.is_nan() { 0.0 } else { s.clamp(0.0, s0) }
}

/// Wall-clock hours from `from` to `to`, saturating at 0.
#[must_use]
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    if delta <= TimeDelta::zero() {
        return 0.0;
    }
    // Microsecond precision; i64 micros covers ~292k years.
    let micros = delta.num_microseconds().unwrap_or(i64::MAX);
    micros as f64 / 3_600_000_000.0
}

/// Hours until a record at `strength` with `decay_rate` drops to `floor`.
///
/// Returns `Some(0.0)` if it is already at or below the floor and `None` if it
/// never gets there (zero rate).
#[must_use]
pub fn hours_until_floor(strength: f64, decay_rate: f64, floor: f64) -> Option<f64> {
    if strength <= floor {
        return Some(0.0);
    }
    if decay_rate <= 0.0 || floor <= 0.0 {
        return None;
    }
    Some((strength / floor).ln() / decay_rate)
}
