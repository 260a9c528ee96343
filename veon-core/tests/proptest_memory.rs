//! Property-based tests for the retention curve, scoring and ranking.
//!
//! Uses `proptest` to check the invariants that must hold for any input:
//! rates stay in band, strength never rises, importance stays in [0, 1], and
//! nothing at or below the floor is ever retrieved.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use veon_core::decay::{self, MAX_DECAY_RATE, MIN_DECAY_RATE};
use veon_core::importance;
use veon_core::retrieval::ranking;
use veon_core::store::{InMemoryStore, MemoryStore};
use veon_core::types::{MemoryId, MemoryRecord, NewMemory};

const FLOOR: f64 = 0.1;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_record() -> impl Strategy<Value = MemoryRecord> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0i64..10_000, 0i64..10_000).prop_map(
        |(importance, strength, created_mins, accessed_mins)| {
            let now = Utc::now();
            let mut record =
                NewMemory::new("p", None, importance, now - Duration::minutes(created_mins))
                    .into_record(MemoryId::new());
            record.strength = strength;
            record.last_accessed = now - Duration::minutes(accessed_mins);
            record
        },
    )
}

// ---------------------------------------------------------------------------
// Decay curve
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn decay_rate_stays_in_band(importance in -10.0..10.0f64) {
        let rate = decay::decay_rate_for(importance);
        prop_assert!((MIN_DECAY_RATE..=MAX_DECAY_RATE).contains(&rate));
    }

    #[test]
    fn decay_rate_non_increasing(a in 0.0..=1.0f64, b in 0.0..=1.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(decay::decay_rate_for(hi) <= decay::decay_rate_for(lo));
    }

    #[test]
    fn zero_elapsed_is_identity(strength in 0.0..=1.0f64, rate in 0.0..1.0f64) {
        let s = decay::decayed_strength(strength, rate, 0.0);
        prop_assert!((s - strength).abs() < f64::EPSILON);
    }

    #[test]
    fn strength_never_rises_with_time(
        strength in 0.0..=1.0f64,
        importance in 0.0..=1.0f64,
        t1 in 0.0..500.0f64,
        dt in 0.0..500.0f64,
    ) {
        let rate = decay::decay_rate_for(importance);
        let earlier = decay::decayed_strength(strength, rate, t1);
        let later = decay::decayed_strength(strength, rate, t1 + dt);
        prop_assert!(later <= earlier);
        prop_assert!((0.0..=strength).contains(&later));
    }

    #[test]
    fn importance_always_in_unit_range(confidence in -5.0..5.0f64, multiplier in 0.0..10.0f64) {
        let i = importance::scaled_importance(confidence, multiplier).expect("finite input");
        prop_assert!((0.0..=1.0).contains(&i));
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ranking_only_returns_live_records(
        records in prop::collection::vec(arb_record(), 0..40),
        limit in 0usize..50,
    ) {
        let live = records.iter().filter(|r| r.strength > FLOOR).count();
        let ranked = ranking::rank_records(records, limit, FLOOR);

        prop_assert_eq!(ranked.len(), live.min(limit));
        prop_assert!(ranked.iter().all(|r| r.strength > FLOOR));
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn store_filters_split_live_and_prunable(strengths in prop::collection::vec(0.0..=1.0f64, 0..30)) {
        let store = InMemoryStore::new();
        for s in &strengths {
            let mut record = NewMemory::new("s", None, 0.5, Utc::now()).into_record(MemoryId::new());
            record.strength = *s;
            store.insert_record(record);
        }

        let live = store.get_all(&veon_core::store::MemoryFilter::live(FLOOR)).expect("live");
        let prunable = store.get_all(&veon_core::store::MemoryFilter::prunable(FLOOR)).expect("prunable");
        let at_floor = strengths.iter().filter(|s| (**s - FLOOR).abs() < f64::EPSILON).count();

        prop_assert_eq!(live.len() + prunable.len() + at_floor, strengths.len());
    }
}
