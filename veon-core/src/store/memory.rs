//! In-process [`MemoryStore`] backed by a map.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, VeonError};
use crate::store::{MemoryFilter, MemoryStore, MemoryUpdate};
use crate::types::{MemoryId, MemoryRecord, NewMemory};

/// Map-backed store. Cheap to create; contents vanish on drop.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<MemoryId, MemoryRecord>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Insert a fully-formed record, bypassing id assignment. Used to seed
    /// fixtures with specific strengths and anchors.
    pub fn insert_record(&self, record: MemoryRecord) {
        self.records.write().insert(record.id, record);
    }
}

impl MemoryStore for InMemoryStore {
    fn create(&self, memory: NewMemory) -> Result<MemoryId> {
        let id = MemoryId::new();
        self.records.write().insert(id, memory.into_record(id));
        debug!(memory = %id, "Created memory");
        Ok(id)
    }

    fn get_all(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>> {
        let mut out: Vec<MemoryRecord> = self
            .records
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        Ok(out)
    }

    fn get_by_id(&self, id: MemoryId) -> Result<Option<MemoryRecord>> {
        Ok(self.records.read().get(&id).cloned())
    }

    fn update(&self, id: MemoryId, update: &MemoryUpdate) -> Result<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(VeonError::NotFound(id))?;
        if let Some(expected) = update.expected_strength {
            if record.strength.to_bits() != expected.to_bits() {
                return Err(VeonError::Conflict(id));
            }
        }
        update.apply_to(record);
        Ok(())
    }

    fn delete(&self, filter: &MemoryFilter) -> Result<usize> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, r| !filter.matches(r));
        Ok(before - records.len())
    }
}
