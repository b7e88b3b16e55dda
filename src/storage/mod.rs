//! Storage module for persisting harvested varieties
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Keyed upsert of variety records
//! - Run tracking with per-run counters

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordId, StorageError, StorageResult, VarietyStore};

use crate::crawler::CultivarRecord;
use crate::HarvestError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A variety row as stored
#[derive(Debug, Clone)]
pub struct StoredVariety {
    pub id: RecordId,
    pub record: CultivarRecord,
    pub first_seen_at: String,
    pub updated_at: String,
    pub last_run_id: Option<i64>,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub pages_fetched: u64,
    pub items_discovered: u64,
    pub items_processed: u64,
    pub items_skipped: u64,
    pub detail_failures: u64,
    pub store_failures: u64,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
