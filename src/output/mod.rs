//! Output module for harvest reports
//!
//! This module handles reading back what previous runs stored and presenting it.

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
