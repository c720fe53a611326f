//! SQLite-based store implementation

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use staffdesk_util::SessionKey;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Scalar entries per session key
            CREATE TABLE IF NOT EXISTS session_entries (
                session_key TEXT NOT NULL,
                entry TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (session_key, entry)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn get_session_value(&self, key: &SessionKey, entry: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM session_entries WHERE session_key = ? AND entry = ?",
                params![key.as_str(), entry],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set_session_value(&self, key: &SessionKey, entry: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO session_entries (session_key, entry, value)
            VALUES (?, ?, ?)
            ON CONFLICT(session_key, entry)
            DO UPDATE SET value = excluded.value
            "#,
            params![key.as_str(), entry, value],
        )?;

        debug!(session_key = %key, entry, "Session entry written");
        Ok(())
    }

    fn clear_session(&self, key: &SessionKey) -> StoreResult<()> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM session_entries WHERE session_key = ?",
            [key.as_str()],
        )?;

        debug!(session_key = %key, removed, "Session entries cleared");
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| staffdesk_util::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }
}
