//! Cultivar-Harvest main entry point
//!
//! This is the command-line interface for the registry harvester.

use anyhow::Context;
use clap::Parser;
use cultivar_harvest::config::{load_config_with_hash, validate, Config};
use cultivar_harvest::crawler::run_crawl;
use cultivar_harvest::url::{listing_base_url, listing_page_url};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cultivar-Harvest: a state registry crawler for plant varieties
///
/// Cultivar-Harvest fetches every listing page of the registry's filtered variety list,
/// follows each entry to its detail page and stores the assembled records in SQLite.
/// Re-running refreshes existing rows instead of duplicating them.
#[derive(Parser, Debug)]
#[command(name = "cultivar-harvest")]
#[command(version)]
#[command(about = "A state registry crawler for plant varieties", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in registry defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// First listing page to fetch
    #[arg(long, value_name = "N")]
    first_page: Option<u32>,

    /// Last listing page to fetch (inclusive)
    #[arg(long, value_name = "N")]
    last_page: Option<u32>,

    /// Stop at the first listing page without entries
    #[arg(long)]
    stop_on_empty_page: bool,

    /// Number of detail pages kept in flight
    #[arg(long, value_name = "N")]
    detail_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Path of the SQLite database
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Validate config and show what would be fetched without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(first_page) = self.first_page {
            config.registry.first_page = first_page;
        }
        if let Some(last_page) = self.last_page {
            config.registry.last_page = last_page;
        }
        if self.stop_on_empty_page {
            config.registry.stop_on_empty_page = true;
        }
        if let Some(concurrency) = self.detail_concurrency {
            config.crawler.detail_concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.http.timeout_secs = Some(timeout);
        }
        if let Some(database) = &self.database {
            config.output.database_path = database.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using registry defaults"),
    }
    let (mut config, config_hash) = match load_config_with_hash(cli.config.as_deref()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid command-line override")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cultivar_harvest=info,warn"),
            1 => EnvFilter::new("cultivar_harvest=debug,info"),
            2 => EnvFilter::new("cultivar_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Cultivar-Harvest Dry Run ===\n");

    println!("Registry:");
    println!("  Host: {}", config.registry.host);
    println!("  Crop: {}", config.registry.crop_name);
    println!(
        "  Pages: {}..={} ({} pages)",
        config.registry.first_page,
        config.registry.last_page,
        config.registry.page_count()
    );
    println!("  Stop on empty page: {}", config.registry.stop_on_empty_page);

    println!("\nHTTP:");
    println!("  Accept: {}", config.http.accept);
    println!("  User-Agent: {}", config.http.user_agent);
    match config.http.timeout_secs {
        Some(secs) => println!("  Timeout: {}s", secs),
        None => println!("  Timeout: none"),
    }

    println!("\nCrawler:");
    println!(
        "  Detail pages in flight: {}",
        config.crawler.detail_concurrency
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let base = listing_base_url(&config.registry)?;
    println!("\nListing URLs:");
    for page in config.registry.first_page..=config.registry.last_page {
        println!(
            "  {}",
            listing_page_url(&base, &config.registry.page_parameter, page)
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch {} listing pages",
        config.registry.page_count()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use cultivar_harvest::output::{load_statistics, print_statistics};
    use cultivar_harvest::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting '{}' from {} into {}",
        config.registry.crop_name,
        config.registry.host,
        config.output.database_path
    );

    match run_crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Parsing finished: {} varieties stored, {} skipped",
                summary.items_processed,
                summary.items_skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
