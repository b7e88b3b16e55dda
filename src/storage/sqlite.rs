//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the VarietyStore trait.

use crate::crawler::{CultivarRecord, RunSummary};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordId, StorageError, StorageResult, VarietyStore};
use crate::storage::{RunRecord, RunStatus, StoredVariety};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, pages_fetched,
     items_discovered, items_processed, items_skipped, detail_failures, store_failures,
     error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    current_run: Option<i64>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            current_run: None,
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            current_run: None,
        })
    }

    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    pub fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Marks a run as finished with the given status and counters
    pub fn close_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3,
             items_discovered = ?4, items_processed = ?5, items_skipped = ?6,
             detail_failures = ?7, store_failures = ?8, error_message = ?9
             WHERE id = ?10",
            params![
                status.to_db_string(),
                now,
                summary.pages_fetched as i64,
                summary.items_discovered as i64,
                summary.items_processed as i64,
                summary.items_skipped as i64,
                summary.detail_failures as i64,
                summary.store_failures as i64,
                error_message,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }

        if self.current_run == Some(run_id) {
            self.current_run = None;
        }

        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Gets the most recent run
    pub fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    pub fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Varieties =====

    pub fn count_varieties(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM potato_varieties", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Gets every stored variety in insertion order
    pub fn list_varieties(&self) -> StorageResult<Vec<StoredVariety>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, year, link, patent_number, description, characteristics,
             first_seen_at, updated_at, last_run_id
             FROM potato_varieties ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(StoredVariety {
                id: row.get(0)?,
                record: CultivarRecord {
                    name: row.get(1)?,
                    year: row.get(2)?,
                    link: row.get(3)?,
                    patent_number: row.get(4)?,
                    description: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    characteristics: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                },
                first_seen_at: row.get(7)?,
                updated_at: row.get(8)?,
                last_run_id: row.get(9)?,
            })
        })?;

        let mut varieties = Vec::new();
        for row in rows {
            varieties.push(row?);
        }
        Ok(varieties)
    }

    /// Gets the number of varieties per inclusion year
    pub fn count_varieties_by_year(&self) -> StorageResult<BTreeMap<i32, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT year, COUNT(*) FROM potato_varieties GROUP BY year")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut by_year = BTreeMap::new();
        for row in rows {
            let (year, count) = row?;
            by_year.insert(year, count as u64);
        }
        Ok(by_year)
    }
}

impl VarietyStore for SqliteStorage {
    fn upsert(&mut self, record: &CultivarRecord) -> StorageResult<RecordId> {
        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO potato_varieties
                 (name, year, link, patent_number, description, characteristics,
                  first_seen_at, updated_at, last_run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8)
             ON CONFLICT(name, year, link) DO UPDATE SET
                 patent_number = excluded.patent_number,
                 description = excluded.description,
                 characteristics = excluded.characteristics,
                 updated_at = excluded.updated_at,
                 last_run_id = excluded.last_run_id
             RETURNING id",
            params![
                record.name,
                record.year,
                record.link,
                record.patent_number,
                record.description,
                record.characteristics,
                now,
                self.current_run
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<Option<i64>> {
        let run_id = self.create_run(config_hash)?;
        self.current_run = Some(run_id);
        Ok(Some(run_id))
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        self.close_run(run_id, RunStatus::Completed, summary, None)
    }

    fn fail_run(&mut self, run_id: i64, summary: &RunSummary, message: &str) -> StorageResult<()> {
        self.close_run(run_id, RunStatus::Failed, summary, Some(message))
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        pages_fetched: row.get::<_, i64>(5)? as u64,
        items_discovered: row.get::<_, i64>(6)? as u64,
        items_processed: row.get::<_, i64>(7)? as u64,
        items_skipped: row.get::<_, i64>(8)? as u64,
        detail_failures: row.get::<_, i64>(9)? as u64,
        store_failures: row.get::<_, i64>(10)? as u64,
        error_message: row.get(11)?,
    })
}
