//! SQLite-backed storage for answers and listing statuses

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;
use zerocopy::AsBytes;

use super::{ListingRecord, ListingStatus, Storage};
use crate::answers::HistoricalAnswer;

/// Single-file SQLite store holding both tables
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create storage under the given directory
    ///
    /// Creates `{dir}/verdigris.db` on first use.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let base = dir.as_ref();
        std::fs::create_dir_all(base)
            .with_context(|| format!("Failed to create data directory {}", base.display()))?;

        let db_path = base.join("verdigris.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;
        Self::init_schema(&db)?;

        Ok(Self { db })
    }

    /// In-memory store for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS historical_answers (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                value TEXT NOT NULL,
                kind TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS listing_statuses (
                listing_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                reason TEXT,
                retryable INTEGER NOT NULL DEFAULT 0,
                session_id TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Count of rows in the answer log
    pub fn answer_count(&self) -> Result<usize> {
        let count: i64 =
            self.db
                .query_row("SELECT COUNT(*) FROM historical_answers", [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }
}

impl Storage for SqliteStorage {
    fn append_historical_answer(&mut self, answer: &HistoricalAnswer) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO historical_answers (label, value, kind, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &answer.label,
                    &answer.value,
                    &answer.kind,
                    answer.embedding.as_bytes(),
                    answer.created_at.to_rfc3339(),
                ],
            )
            .context("Failed to append historical answer")?;
        Ok(())
    }

    fn all_historical_answers(&self) -> Result<Vec<HistoricalAnswer>> {
        let mut stmt = self.db.prepare(
            "SELECT label, value, kind, embedding, created_at
             FROM historical_answers ORDER BY rowid",
        )?;

        let answers = stmt
            .query_map([], |row| {
                let blob: Vec<u8> = row.get(3)?;
                Ok(HistoricalAnswer {
                    label: row.get(0)?,
                    value: row.get(1)?,
                    kind: row.get(2)?,
                    embedding: bytes_to_vec_f32(&blob),
                    created_at: row.get::<_, DateTime<Utc>>(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read answer log")?;

        Ok(answers)
    }

    fn set_listing_status(&mut self, record: &ListingRecord) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO listing_statuses
                 (listing_id, status, reason, retryable, session_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &record.listing_id,
                    record.status.as_str(),
                    &record.reason,
                    record.retryable,
                    record.session_id.map(|id| id.to_string()),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .context("Failed to upsert listing status")?;
        Ok(())
    }

    fn all_listing_statuses(&self) -> Result<Vec<ListingRecord>> {
        let mut stmt = self.db.prepare(
            "SELECT listing_id, status, reason, retryable, session_id, updated_at
             FROM listing_statuses ORDER BY updated_at DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, DateTime<Utc>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read listing statuses")?;

        rows.into_iter()
            .map(|(listing_id, status, reason, retryable, session_id, updated_at)| {
                let status = ListingStatus::parse(&status)
                    .with_context(|| format!("Unknown listing status: {status}"))?;
                Ok(ListingRecord {
                    listing_id,
                    status,
                    reason,
                    retryable,
                    session_id: session_id.and_then(|s| Uuid::parse_str(&s).ok()),
                    updated_at,
                })
            })
            .collect()
    }
}

/// Convert a little-endian f32 blob back to a vector
fn bytes_to_vec_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
