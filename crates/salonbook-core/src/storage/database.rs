//! SQLite-backed local state: persisted scheduler keys and dispatch history.
//!
//! Two tables:
//! - `kv` -- single-key settings shared by the scheduler loop and the
//!   manual trigger path. Writes are atomic per key, last-writer-wins.
//! - `sync_passes` -- one row per dispatch pass with the aggregate counts
//!   and the per-item results as JSON.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::dispatch::types::{SmsResult, SyncResult};
use crate::error::{CoreError, DatabaseError};

/// Persisted key names.
pub mod keys {
    pub const SYNC_INTERVAL_MINUTES: &str = "sync_interval_minutes";
    pub const AUTO_SYNC_ENABLED: &str = "auto_sync_enabled";
    pub const LAST_SYNC_AT: &str = "last_sync_at";
    pub const LAST_REMINDER_FOUND_AT: &str = "last_reminder_found_at";
    pub const LAST_STATUS: &str = "last_status";
}

/// Default dispatch interval when none was ever configured.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 30;

/// One recorded dispatch pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassRecord {
    pub pass_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<SmsResult>,
}

/// SQLite database for scheduler state and dispatch history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/salonbook/salonbook.db`.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("salonbook.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sync_passes (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    pass_id     TEXT NOT NULL,
                    started_at  TEXT NOT NULL,
                    finished_at TEXT NOT NULL,
                    total       INTEGER NOT NULL,
                    sent        INTEGER NOT NULL,
                    failed      INTEGER NOT NULL,
                    results     TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sync_passes_finished_at
                    ON sync_passes(finished_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(DatabaseError::from)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Configured base dispatch interval. Values are stored as entered;
    /// the scheduler clamps to the platform minimum when reading.
    pub fn sync_interval_minutes(&self) -> Result<u32, DatabaseError> {
        Ok(self
            .kv_get(keys::SYNC_INTERVAL_MINUTES)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SYNC_INTERVAL_MINUTES))
    }

    pub fn set_sync_interval_minutes(&self, minutes: u32) -> Result<(), DatabaseError> {
        self.kv_set(keys::SYNC_INTERVAL_MINUTES, &minutes.to_string())
    }

    pub fn auto_sync_enabled(&self) -> Result<bool, DatabaseError> {
        Ok(self
            .kv_get(keys::AUTO_SYNC_ENABLED)?
            .map(|v| v == "true")
            .unwrap_or(true))
    }

    pub fn set_auto_sync_enabled(&self, enabled: bool) -> Result<(), DatabaseError> {
        self.kv_set(keys::AUTO_SYNC_ENABLED, if enabled { "true" } else { "false" })
    }

    pub fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.kv_timestamp(keys::LAST_SYNC_AT)
    }

    pub fn touch_last_sync(&self, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.kv_set(keys::LAST_SYNC_AT, &at.to_rfc3339())
    }

    pub fn last_reminder_found_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.kv_timestamp(keys::LAST_REMINDER_FOUND_AT)
    }

    pub fn touch_last_reminder_found(&self, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.kv_set(keys::LAST_REMINDER_FOUND_AT, &at.to_rfc3339())
    }

    pub fn last_status(&self) -> Result<Option<String>, DatabaseError> {
        self.kv_get(keys::LAST_STATUS)
    }

    pub fn set_last_status(&self, status: &str) -> Result<(), DatabaseError> {
        self.kv_set(keys::LAST_STATUS, status)
    }

    fn kv_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        Ok(self.kv_get(key)?.and_then(|v| {
            DateTime::parse_from_rfc3339(&v)
                .ok()
                .map(|t| t.with_timezone(&Utc))
        }))
    }

    // ── Dispatch history ─────────────────────────────────────────────

    /// Append one pass to the history, returning its id.
    pub fn record_pass(
        &self,
        result: &SyncResult,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<String, DatabaseError> {
        let pass_id = Uuid::new_v4().to_string();
        let results_json = serde_json::to_string(&result.results)
            .map_err(|e| DatabaseError::QueryFailed(format!("results encode: {e}")))?;
        self.conn.execute(
            "INSERT INTO sync_passes
                (pass_id, started_at, finished_at, total, sent, failed, results)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                pass_id,
                started_at.to_rfc3339(),
                finished_at.to_rfc3339(),
                result.total as i64,
                result.sent as i64,
                result.failed as i64,
                results_json,
            ],
        )?;
        Ok(pass_id)
    }

    /// Most recent passes, newest first.
    pub fn recent_passes(&self, limit: usize) -> Result<Vec<PassRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT pass_id, started_at, finished_at, total, sent, failed, results
             FROM sync_passes
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (pass_id, started, finished, total, sent, failed, results_json) = row?;
            let parse_ts = |raw: &str| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| DatabaseError::QueryFailed(format!("timestamp decode: {e}")))
            };
            let results: Vec<SmsResult> = serde_json::from_str(&results_json)
                .map_err(|e| DatabaseError::QueryFailed(format!("results decode: {e}")))?;
            records.push(PassRecord {
                pass_id,
                started_at: parse_ts(&started)?,
                finished_at: parse_ts(&finished)?,
                total: total as usize,
                sent: sent as usize,
                failed: failed as usize,
                results,
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_roundtrip_and_overwrite() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.kv_get("missing").unwrap(), None);

        db.kv_set("k", "v1").unwrap();
        db.kv_set("k", "v2").unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn interval_defaults_and_persists() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.sync_interval_minutes().unwrap(), DEFAULT_SYNC_INTERVAL_MINUTES);

        db.set_sync_interval_minutes(45).unwrap();
        assert_eq!(db.sync_interval_minutes().unwrap(), 45);
    }

    #[test]
    fn auto_sync_defaults_to_enabled() {
        let db = Database::open_memory().unwrap();
        assert!(db.auto_sync_enabled().unwrap());

        db.set_auto_sync_enabled(false).unwrap();
        assert!(!db.auto_sync_enabled().unwrap());
    }

    #[test]
    fn timestamps_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.last_sync_at().unwrap().is_none());

        let now = Utc::now();
        db.touch_last_sync(now).unwrap();
        let stored = db.last_sync_at().unwrap().unwrap();
        assert_eq!(stored.timestamp(), now.timestamp());
    }

    #[test]
    fn pass_history_is_newest_first_and_limited() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();

        for i in 0..3 {
            let mut result = SyncResult::empty();
            result.push(SmsResult::sent(format!("app-{i}")));
            db.record_pass(&result, now, now).unwrap();
        }

        let recent = db.recent_passes(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].results[0].appointment_id, "app-2");
        assert_eq!(recent[1].results[0].appointment_id, "app-1");
        assert_eq!(recent[0].total, 1);
    }

    #[test]
    fn open_at_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salonbook.db");

        {
            let db = Database::open_at(&path).unwrap();
            db.set_sync_interval_minutes(20).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.sync_interval_minutes().unwrap(), 20);
    }
}
