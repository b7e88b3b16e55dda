//! Configuration module for Cultivar-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! An absent file and an empty file both yield the built-in registry defaults.
//!
//! # Example
//!
//! ```no_run
//! use cultivar_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling pages {}..={}", config.registry.first_page, config.registry.last_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, RegistryConfig, DEFAULT_ACCEPT,
    DEFAULT_CROP_NAME, DEFAULT_HOST, DEFAULT_LISTING_URL, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{hash_config_content, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_DETAIL_CONCURRENCY};
