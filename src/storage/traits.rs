//! Storage traits and error types
//!
//! This module defines the persistence boundary the crawler writes through and its
//! associated error types.

use crate::crawler::{CultivarRecord, RunSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identifier the store assigns to a persisted record
pub type RecordId = i64;

/// Persistence boundary for harvested varieties
///
/// The crawler calls [`VarietyStore::upsert`] once per assembled record, in discovery order,
/// and never assumes anything about uniqueness: whether a repeated record replaces or
/// duplicates an earlier one is the store's policy.
///
/// The run hooks let a store keep a history of crawl runs; stores without one can rely on
/// the no-op defaults.
pub trait VarietyStore {
    /// Persists one record and returns its identifier
    fn upsert(&mut self, record: &CultivarRecord) -> StorageResult<RecordId>;

    /// Called once before anything is fetched
    ///
    /// # Returns
    ///
    /// The ID of the newly created run, if the store tracks runs
    fn begin_run(&mut self, _config_hash: &str) -> StorageResult<Option<i64>> {
        Ok(None)
    }

    /// Called after the last record of a successful run
    fn finish_run(&mut self, _run_id: i64, _summary: &RunSummary) -> StorageResult<()> {
        Ok(())
    }

    /// Called when the run aborts
    fn fail_run(
        &mut self,
        _run_id: i64,
        _summary: &RunSummary,
        _message: &str,
    ) -> StorageResult<()> {
        Ok(())
    }
}

impl<S: VarietyStore + ?Sized> VarietyStore for &mut S {
    fn upsert(&mut self, record: &CultivarRecord) -> StorageResult<RecordId> {
        (**self).upsert(record)
    }

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<Option<i64>> {
        (**self).begin_run(config_hash)
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        (**self).finish_run(run_id, summary)
    }

    fn fail_run(&mut self, run_id: i64, summary: &RunSummary, message: &str) -> StorageResult<()> {
        (**self).fail_run(run_id, summary, message)
    }
}
