//! State module for tracking crawl progress
//!
//! `CrawlPhase` records where a run currently is in the listing → detail → persist pipeline
//! and rejects transitions the pipeline can never make.

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
