//! SQLite-backed [`MemoryStore`].
//!
//! One row per memory record:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS memories (
//!     id            TEXT PRIMARY KEY,
//!     content       TEXT NOT NULL,
//!     emotion       TEXT,
//!     importance    REAL NOT NULL,
//!     decay_rate    REAL NOT NULL,
//!     strength      REAL NOT NULL,
//!     created_at    TEXT NOT NULL,
//!     last_accessed TEXT NOT NULL
//! );
//! ```
//!
//! Timestamps are fixed-width RFC 3339 (microseconds, `Z`) so they sort
//! lexically. Strength is an IEEE double, which makes the conditional
//! `AND strength = ?` check exact.
//!
//! `rusqlite::Connection` is not `Sync`; the store serialises access through
//! a mutex so one handle can be shared across request tasks.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::error::{Result, VeonError};
use crate::store::{MemoryFilter, MemoryStore, MemoryUpdate};
use crate::types::{MemoryId, MemoryRecord, NewMemory};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memories (
        id            TEXT PRIMARY KEY,
        content       TEXT NOT NULL,
        emotion       TEXT,
        importance    REAL NOT NULL,
        decay_rate    REAL NOT NULL,
        strength      REAL NOT NULL,
        created_at    TEXT NOT NULL,
        last_accessed TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_memories_strength ON memories (strength);";

const COLUMNS: &str =
    "id, content, emotion, importance, decay_rate, strength, created_at, last_accessed";

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Handle to an open SQLite database holding memory records.
///
/// # Usage
///
/// ```no_run
/// # use veon_core::store::{MemoryStore, SqliteStore, MemoryFilter};
/// # use veon_core::config::PersistenceConfig;
/// # use veon_core::types::NewMemory;
/// let store = SqliteStore::open("veon.db", &PersistenceConfig::default())?;
/// let id = store.create(NewMemory::new("We went hiking", None, 0.6, chrono::Utc::now()))?;
/// let live = store.get_all(&MemoryFilter::live(0.1))?;
/// # Ok::<(), veon_core::error::VeonError>(())
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// The schema is created if it does not exist. WAL mode is enabled when
    /// `config.wal_mode` is `true`.
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            // journal_mode returns a row; execute_batch discards it.
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "VEON memory store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Open the database named by `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] on SQLite failures.
    pub fn open_configured(config: &PersistenceConfig) -> Result<Self> {
        Self::open(&config.path, config)
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Total number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] on SQLite failures.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Run SQLite's integrity check. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Reclaim space left behind by pruning.
    ///
    /// # Errors
    ///
    /// Returns [`VeonError::Database`] on SQLite failures.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.lock().execute_batch("VACUUM;")?;
        Ok(())
    }
}

impl MemoryStore for SqliteStore {
    fn create(&self, memory: NewMemory) -> Result<MemoryId> {
        let id = MemoryId::new();
        let created = encode_time(memory.created_at);

        self.conn.lock().execute(
            "INSERT INTO memories (id, content, emotion, importance, decay_rate, strength, created_at, last_accessed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id.0.to_string(),
                memory.content,
                memory.emotion_tag,
                memory.importance,
                memory.decay_rate,
                memory.strength,
                created,
            ],
        )?;

        debug!(memory = %id, importance = memory.importance, "Created memory");
        Ok(id)
    }

    fn get_all(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>> {
        let start = Instant::now();
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT {COLUMNS} FROM memories{clause} ORDER BY created_at ASC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_record)?;
        let records = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            rows = records.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded memories"
        );
        Ok(records)
    }

    fn get_by_id(&self, id: MemoryId) -> Result<Option<MemoryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!("SELECT {COLUMNS} FROM memories WHERE id = ?1"))?;
        let record = stmt
            .query_row(params![id.0.to_string()], row_to_record)
            .optional()?;
        Ok(record)
    }

    fn update(&self, id: MemoryId, update: &MemoryUpdate) -> Result<()> {
        let conn = self.conn.lock();

        if update.is_empty() {
            return if exists(&conn, id)? {
                Ok(())
            } else {
                Err(VeonError::NotFound(id))
            };
        }

        let mut sets = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(strength) = update.strength {
            values.push(Value::Real(strength));
            sets.push(format!("strength = ?{}", values.len()));
        }
        if let Some(at) = update.last_accessed {
            values.push(Value::Text(encode_time(at)));
            sets.push(format!("last_accessed = ?{}", values.len()));
        }
        values.push(Value::Text(id.0.to_string()));
        let mut sql = format!(
            "UPDATE memories SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        if let Some(expected) = update.expected_strength {
            values.push(Value::Real(expected));
            sql.push_str(&format!(" AND strength = ?{}", values.len()));
        }

        let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
        if changed > 0 {
            return Ok(());
        }
        if exists(&conn, id)? {
            Err(VeonError::Conflict(id))
        } else {
            Err(VeonError::NotFound(id))
        }
    }

    fn delete(&self, filter: &MemoryFilter) -> Result<usize> {
        let (clause, values) = where_clause(filter);
        let deleted = self
            .conn
            .lock()
            .execute(&format!("DELETE FROM memories{clause}"), params_from_iter(values.iter()))?;
        debug!(deleted, "Deleted memories");
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn exists(conn: &Connection, id: MemoryId) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM memories WHERE id = ?1",
            params![id.0.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Build ` WHERE ...` (or an empty string) plus positional values.
fn where_clause(filter: &MemoryFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(id) = filter.id {
        values.push(Value::Text(id.0.to_string()));
        conditions.push(format!("id = ?{}", values.len()));
    }
    if let Some(threshold) = filter.strength_above {
        values.push(Value::Real(threshold));
        conditions.push(format!("strength > ?{}", values.len()));
    }
    if let Some(threshold) = filter.strength_below {
        values.push(Value::Real(threshold));
        conditions.push(format!("strength < ?{}", values.len()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(6)?;
    let last_accessed: String = row.get(7)?;

    Ok(MemoryRecord {
        id: MemoryId(
            Uuid::parse_str(&id)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        ),
        content: row.get(1)?,
        emotion_tag: row.get(2)?,
        importance: row.get(3)?,
        decay_rate: row.get(4)?,
        strength: row.get(5)?,
        created_at: decode_time(6, &created_at)?,
        last_accessed: decode_time(7, &last_accessed)?,
    })
}

fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn sample(content: &str, importance: f64) -> NewMemory {
        NewMemory::new(content, Some("joy".into()), importance, Utc::now())
    }

    #[test]
    fn round_trip_create_get() {
        let store = SqliteStore::open_in_memory().expect("open");
        let memory = sample("My sister got married last week", 0.9);
        let created_at = memory.created_at;
        let id = store.create(memory).expect("create");

        let loaded = store.get_by_id(id).expect("get").expect("Some");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.content, "My sister got married last week");
        assert_eq!(loaded.emotion_tag.as_deref(), Some("joy"));
        assert!((loaded.importance - 0.9).abs() < 1e-12);
        assert!((loaded.decay_rate - 0.02).abs() < 1e-12);
        assert!((loaded.strength - 1.0).abs() < 1e-12);
        // Microsecond precision survives the text encoding.
        assert_eq!(
            loaded.created_at.timestamp_micros(),
            created_at.timestamp_micros()
        );
        assert_eq!(loaded.created_at, loaded.last_accessed);
    }

    #[test]
    fn missing_id_returns_none() {
        let store = SqliteStore::open_in_memory().expect("open");
        assert!(store.get_by_id(MemoryId::new()).expect("get").is_none());
    }

    #[test]
    fn update_strength_and_anchor() {
        let store = SqliteStore::open_in_memory().expect("open");
        let id = store.create(sample("coffee", 0.1)).expect("create");
        let later = Utc::now() + ChronoDuration::hours(3);

        store
            .update(id, &MemoryUpdate::strength(0.42).touched_at(later))
            .expect("update");

        let loaded = store.get_by_id(id).expect("get").expect("Some");
        assert!((loaded.strength - 0.42).abs() < 1e-12);
        assert_eq!(loaded.last_accessed.timestamp_micros(), later.timestamp_micros());
    }

    #[test]
    fn conditional_update_conflict_and_not_found() {
        let store = SqliteStore::open_in_memory().expect("open");
        let id = store.create(sample("exam tomorrow", 0.5)).expect("create");

        let stale = MemoryUpdate::strength(0.3).expecting(0.5);
        assert!(matches!(store.update(id, &stale), Err(VeonError::Conflict(_))));

        let fresh = MemoryUpdate::strength(0.3).expecting(1.0);
        store.update(id, &fresh).expect("fresh expectation");

        let missing = store.update(MemoryId::new(), &MemoryUpdate::strength(0.3));
        assert!(matches!(missing, Err(VeonError::NotFound(_))));
    }

    #[test]
    fn filters_translate_to_sql() {
        let store = SqliteStore::open_in_memory().expect("open");
        let strong = store.create(sample("strong", 0.9)).expect("create");
        let weak = store.create(sample("weak", 0.1)).expect("create");
        let gone = store.create(sample("gone", 0.1)).expect("create");
        store.update(weak, &MemoryUpdate::strength(0.05)).expect("update");
        store.update(gone, &MemoryUpdate::strength(0.0)).expect("update");

        let live = store.get_all(&MemoryFilter::live(0.1)).expect("live");
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, strong);

        assert_eq!(store.get_all(&MemoryFilter::decaying()).expect("decaying").len(), 2);
        assert_eq!(store.get_all(&MemoryFilter::all()).expect("all").len(), 3);

        assert_eq!(store.delete(&MemoryFilter::prunable(0.1)).expect("delete"), 2);
        assert_eq!(store.count().expect("count"), 1);
        assert_eq!(store.delete(&MemoryFilter::prunable(0.1)).expect("delete"), 0);
    }

    #[test]
    fn get_all_is_oldest_first() {
        let store = SqliteStore::open_in_memory().expect("open");
        let now = Utc::now();
        let newer = store
            .create(NewMemory::new("newer", None, 0.5, now))
            .expect("create");
        let older = store
            .create(NewMemory::new("older", None, 0.5, now - ChronoDuration::hours(1)))
            .expect("create");

        let all = store.get_all(&MemoryFilter::all()).expect("all");
        assert_eq!(all[0].id, older);
        assert_eq!(all[1].id, newer);
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PersistenceConfig {
            path: dir.path().join("veon.db"),
            ..PersistenceConfig::default()
        };

        let id = {
            let store = SqliteStore::open_configured(&config).expect("open");
            store.create(sample("we adopted a puppy", 0.8)).expect("create")
        };

        let reopened = SqliteStore::open_configured(&config).expect("reopen");
        let loaded = reopened.get_by_id(id).expect("get").expect("Some");
        assert_eq!(loaded.content, "we adopted a puppy");
        assert!(reopened.integrity_check().expect("check"));
        reopened.vacuum().expect("vacuum");
    }
}
