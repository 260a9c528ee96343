//! Memory Retrieval: ranked selection of live memories.
//!
//! Two consumers share one ranking rule (see [`ranking`]):
//!   - the generation context: a handful of records rendered to text and
//!     handed to the text-generation collaborator;
//!   - the display set: a larger list returned to the front end.
//!
//! Retrieval reads stored strength as-is. If the preceding decay pass could
//! not persist some records their strength is stale, and they are still
//! ranked on it rather than dropped.

pub mod ranking;

use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::store::{MemoryFilter, MemoryStore};
use crate::types::MemoryRecord;

/// The retrieval engine that ranks live memories.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalEngine {
    floor: f64,
}

impl RetrievalEngine {
    /// Create an engine that treats `strength > floor` as live.
    #[must_use]
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// The live threshold.
    #[must_use]
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Up to `limit` live records, best first.
    ///
    /// # Errors
    /// Storage failures while listing records.
    pub fn rank<S: MemoryStore + ?Sized>(&self, store: &S, limit: usize) -> Result<Vec<MemoryRecord>> {
        let start = Instant::now();
        let candidates = store.get_all(&MemoryFilter::live(self.floor))?;
        let candidate_count = candidates.len();
        let ranked = ranking::rank_records(candidates, limit, self.floor);

        debug!(
            candidates = candidate_count,
            returned = ranked.len(),
            limit,
            elapsed_us = start.elapsed().as_micros(),
            "Ranked memories"
        );
        Ok(ranked)
    }

    /// Rank and render the top `limit` records as generation context.
    ///
    /// Returns an empty string when nothing is live.
    ///
    /// # Errors
    /// Storage failures while listing records.
    pub fn context<S: MemoryStore + ?Sized>(&self, store: &S, limit: usize) -> Result<String> {
        Ok(render_context(&self.rank(store, limit)?))
    }
}

/// Render records, in order, as one `[Memory: ... (strength: 0.00)]` line each.
#[must_use]
pub fn render_context(records: &[MemoryRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "[Memory: {} (strength: {:.2})]",
            record.content, record.strength
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, MemoryUpdate};
    use crate::types::{MemoryId, NewMemory};
    use chrono::Utc;

    #[test]
    fn renders_in_order_with_two_decimals() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let a = store
            .create(NewMemory::new("I love hiking", None, 0.9, now))
            .expect("create");
        store
            .create(NewMemory::new("Had toast", None, 0.2, now))
            .expect("create");
        store.update(a, &MemoryUpdate::strength(0.456)).expect("update");

        let context = RetrievalEngine::new(0.1).context(&store, 5).expect("context");
        assert_eq!(
            context,
            "[Memory: I love hiking (strength: 0.46)]\n[Memory: Had toast (strength: 1.00)]"
        );
    }

    #[test]
    fn single_record_has_no_trailing_newline() {
        let record = NewMemory::new("first snow", None, 0.4, Utc::now()).into_record(MemoryId::new());
        assert_eq!(render_context(&[record]), "[Memory: first snow (strength: 1.00)]");
        assert_eq!(render_context(&[]), "");
    }

    #[test]
    fn empty_store_gives_empty_context() {
        let store = InMemoryStore::new();
        assert_eq!(RetrievalEngine::new(0.1).context(&store, 5).expect("context"), "");
    }
}
