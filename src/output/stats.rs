//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, SqliteStorage};
use crate::HarvestError;
use std::collections::BTreeMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of stored varieties
    pub total_varieties: u64,

    /// Number of recorded runs, including failed ones
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Count of varieties per inclusion year
    pub varieties_by_year: BTreeMap<i32, u64>,
}

impl HarvestStatistics {
    /// Wall-clock duration of the latest run in seconds, if it finished
    pub fn latest_run_duration_seconds(&self) -> Option<i64> {
        let run = self.latest_run.as_ref()?;
        let started = run
            .started_at
            .parse::<chrono::DateTime<chrono::Utc>>()
            .ok()?;
        let finished = run
            .finished_at
            .as_deref()?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .ok()?;
        Some((finished - started).num_seconds())
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The database to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &SqliteStorage) -> Result<HarvestStatistics, HarvestError> {
    Ok(HarvestStatistics {
        total_varieties: storage.count_varieties()?,
        total_runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
        varieties_by_year: storage.count_varieties_by_year()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Varieties stored: {}", stats.total_varieties);
    println!("  Runs recorded: {}", stats.total_runs);
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        if let Some(seconds) = stats.latest_run_duration_seconds() {
            println!("  Duration: {}s", seconds);
        }
        println!("  Listing pages fetched: {}", run.pages_fetched);
        println!("  Entries discovered: {}", run.items_discovered);
        println!("  Entries stored: {}", run.items_processed);
        println!("  Entries skipped: {}", run.items_skipped);
        println!("  Detail pages unavailable: {}", run.detail_failures);
        println!("  Store failures: {}", run.store_failures);
        if let Some(message) = &run.error_message {
            println!("  Error: {}", message);
        }
        println!();
    }

    if !stats.varieties_by_year.is_empty() {
        println!("Varieties by Inclusion Year:");
        for (year, count) in &stats.varieties_by_year {
            let percentage = if stats.total_varieties > 0 {
                (*count as f64 / stats.total_varieties as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", year, count, percentage);
        }
    }
}
