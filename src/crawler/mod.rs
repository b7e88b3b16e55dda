//! Crawler module for registry fetching and extraction
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with the registry's browser-like header profile
//! - Listing page parsing into variety stubs
//! - Detail page extraction of free-text fields
//! - Record assembly and overall crawl coordination

mod assembler;
mod coordinator;
mod detail;
mod fetcher;
mod listing;

pub use assembler::{assemble, parse_year, CultivarRecord, ValidationError};
pub use coordinator::{run_crawl, Coordinator, RunSummary};
pub use detail::{extract_detail, DetailInfo, CHARACTERISTICS_MARKER, DESCRIPTION_MARKER};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use listing::{parse_listing, ListingItem};
