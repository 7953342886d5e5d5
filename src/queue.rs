use chrono::{DateTime, Local};
use log::warn;
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::recorder::SessionSummary;

/// Durable store for session summaries awaiting upload.
///
/// Summaries land here whenever the backend is unreachable and are removed
/// one by one as a flush delivers them.
#[derive(Debug)]
pub struct OfflineQueue {
    conn: Connection,
}

impl OfflineQueue {
    /// Open the queue at its default state-directory location.
    pub fn open_default() -> Result<Self> {
        let db_path = AppDirs::queue_db_path().unwrap_or_else(|| PathBuf::from("pacer_queue.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(&db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS pending_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                total_seconds INTEGER NOT NULL,
                inhale_secs REAL NOT NULL,
                hold_high_secs REAL NOT NULL,
                exhale_secs REAL NOT NULL,
                hold_low_secs REAL NOT NULL,
                technique TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                queued_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pending_sessions_queued_at ON pending_sessions(queued_at)",
            [],
        )?;

        Ok(OfflineQueue { conn })
    }

    /// Persist a summary for later delivery.
    pub fn enqueue(&self, summary: &SessionSummary) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO pending_sessions
            (total_seconds, inhale_secs, hold_high_secs, exhale_secs, hold_low_secs, technique, completed_at, queued_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                summary.total_seconds,
                summary.inhale_secs,
                summary.hold_high_secs,
                summary.exhale_secs,
                summary.hold_low_secs,
                summary.technique,
                summary.completed_at.to_rfc3339(),
                Local::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// All queued summaries, oldest first, paired with their entry ids.
    /// Rows that no longer parse are skipped, never fatal to a flush.
    pub fn pending(&self) -> Result<Vec<(i64, SessionSummary)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, total_seconds, inhale_secs, hold_high_secs, exhale_secs, hold_low_secs, technique, completed_at
            FROM pending_sessions
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let completed_at_str: String = row.get(7)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        7,
                        "completed_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok((
                row.get::<_, i64>(0)?,
                SessionSummary {
                    total_seconds: row.get(1)?,
                    inhale_secs: row.get(2)?,
                    hold_high_secs: row.get(3)?,
                    exhale_secs: row.get(4)?,
                    hold_low_secs: row.get(5)?,
                    technique: row.get(6)?,
                    completed_at,
                },
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            match row {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("skipping unreadable queue entry: {e}"),
            }
        }

        Ok(entries)
    }

    /// Remove a delivered entry.
    pub fn remove(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM pending_sessions WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pending_sessions", [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
