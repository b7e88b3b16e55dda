//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one full pass over the registry:
//! - Fetching every listing page concurrently and waiting for all of them
//! - Parsing each page into stubs, in page order
//! - Fetching and extracting detail pages in discovery order
//! - Assembling records and handing them to the store one at a time

use crate::config::{validate, Config};
use crate::crawler::assembler::assemble;
use crate::crawler::detail::{extract_detail, DetailInfo};
use crate::crawler::fetcher::{FetchError, HttpFetcher, PageFetcher};
use crate::crawler::listing::{parse_listing, ListingItem};
use crate::state::CrawlPhase;
use crate::storage::{SqliteStorage, VarietyStore};
use crate::url::{listing_base_url, page_params, registry_host};
use crate::HarvestError;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use url::Url;

/// Counters describing one finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Listing pages fetched during the fan-out
    pub pages_fetched: usize,

    /// Listing pages parsed before the run finished or stopped at an empty page
    pub pages_parsed: usize,

    /// Stubs found across all parsed pages
    pub items_discovered: usize,

    /// Records accepted by the store
    pub items_processed: usize,

    /// Stubs that failed validation
    pub items_skipped: usize,

    /// Detail pages that could not be fetched (their records were still stored)
    pub detail_failures: usize,

    /// Records the store rejected
    pub store_failures: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    config: Config,
    config_hash: String,
    fetcher: F,
    store: S,
    listing_base: Url,
    host: Url,
    phase: CrawlPhase,
}

impl Coordinator<HttpFetcher, SqliteStorage> {
    /// Creates a coordinator that talks HTTP and writes to the configured SQLite database
    pub fn from_config(config: Config, config_hash: String) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::from_config(&config.http)?;
        let store = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::new(config, config_hash, fetcher, store)
    }
}

impl<F: PageFetcher, S: VarietyStore> Coordinator<F, S> {
    /// Creates a new coordinator instance
    ///
    /// The configuration is validated first, so a coordinator never runs with settings the
    /// CLI would have rejected.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash recorded on the run row
    /// * `fetcher` - Source of listing and detail pages
    /// * `store` - Destination for assembled records
    pub fn new(
        config: Config,
        config_hash: String,
        fetcher: F,
        store: S,
    ) -> Result<Self, HarvestError> {
        validate(&config)?;
        let listing_base = listing_base_url(&config.registry)?;
        let host = registry_host(&config.registry)?;

        Ok(Self {
            config,
            config_hash,
            fetcher,
            store,
            listing_base,
            host,
            phase: CrawlPhase::Idle,
        })
    }

    /// Current phase of the run
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// The store records were written to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the coordinator, returning the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the crawl to completion
    ///
    /// A failed listing fetch aborts the run; records persisted before that point stay.
    /// Every other failure is confined to the entry it happened on.
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        let run_id = self.store.begin_run(&self.config_hash)?;
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        tracing::info!(
            first_page = self.config.registry.first_page,
            last_page = self.config.registry.last_page,
            detail_concurrency = self.config.crawler.detail_concurrency,
            "Starting harvest run"
        );

        match self.execute(&mut summary).await {
            Ok(()) => {
                if let Some(run_id) = run_id {
                    self.store.finish_run(run_id, &summary)?;
                }

                tracing::info!(
                    pages = summary.pages_parsed,
                    processed = summary.items_processed,
                    skipped = summary.items_skipped,
                    detail_failures = summary.detail_failures,
                    store_failures = summary.store_failures,
                    "Harvest completed in {:?}",
                    start_time.elapsed()
                );
                Ok(summary)
            }
            Err(e) => {
                if !self.phase.is_terminal() {
                    self.phase = CrawlPhase::Aborted;
                }

                if let Some(run_id) = run_id {
                    if let Err(store_err) =
                        self.store.fail_run(run_id, &summary, &e.to_string())
                    {
                        tracing::warn!("Failed to record aborted run {}: {}", run_id, store_err);
                    }
                }

                tracing::error!(
                    processed = summary.items_processed,
                    "Harvest aborted: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn execute(&mut self, summary: &mut RunSummary) -> Result<(), HarvestError> {
        advance(&mut self.phase, CrawlPhase::FetchingListings)?;
        let pages = self.fetch_listing_pages().await?;
        summary.pages_fetched = pages.len();

        for (page, html) in pages {
            advance(&mut self.phase, CrawlPhase::ParsingListing)?;

            let items = parse_listing(&html, &self.host);
            summary.pages_parsed += 1;
            tracing::info!(page, entries = items.len(), "Parsed listing page");

            if items.is_empty() && self.config.registry.stop_on_empty_page {
                tracing::info!(page, "Listing page has no entries, stopping");
                break;
            }

            summary.items_discovered += items.len();
            self.process_items(items, summary).await?;
        }

        advance(&mut self.phase, CrawlPhase::Done)?;
        Ok(())
    }

    /// Fetches every listing page in the configured range at once
    ///
    /// Returns page texts in page order once all requests have completed, or the first
    /// failure in page order.
    async fn fetch_listing_pages(&self) -> Result<Vec<(u32, String)>, HarvestError> {
        let registry = &self.config.registry;
        let fetcher = &self.fetcher;
        let base = self.listing_base.as_str();

        tracing::info!(
            pages = registry.page_count(),
            "Fetching listing pages concurrently"
        );

        let requests = (registry.first_page..=registry.last_page).map(|page| {
            let params = page_params(&registry.page_parameter, page);
            async move { (page, fetcher.fetch(base, &params).await) }
        });

        let mut pages = Vec::with_capacity(registry.page_count() as usize);
        for (page, result) in join_all(requests).await {
            match result {
                Ok(html) => pages.push((page, html)),
                Err(source) => return Err(HarvestError::ListingFetch { page, source }),
            }
        }

        Ok(pages)
    }

    /// Runs the detail stage for one page's stubs
    ///
    /// Up to `detail_concurrency` detail pages are in flight; results are consumed, assembled
    /// and persisted strictly in discovery order.
    async fn process_items(
        &mut self,
        items: Vec<ListingItem>,
        summary: &mut RunSummary,
    ) -> Result<(), HarvestError> {
        let Self {
            fetcher,
            store,
            phase,
            config,
            ..
        } = self;
        let fetcher = &*fetcher;

        let mut details = stream::iter(items)
            .map(|item| async move {
                let fetched = fetcher.fetch(&item.detail_url, &[]).await;
                (item, fetched)
            })
            .buffered(config.crawler.detail_concurrency);

        while let Some((item, fetched)) = details.next().await {
            advance(phase, CrawlPhase::FetchingDetail)?;
            let detail = match fetched {
                Ok(html) => {
                    advance(phase, CrawlPhase::ExtractingDetail)?;
                    let detail = extract_detail(&html);
                    if detail.is_empty() {
                        tracing::debug!(
                            name = %item.name,
                            "Detail page has neither description nor characteristics"
                        );
                    }
                    detail
                }
                Err(e) => {
                    summary.detail_failures += 1;
                    log_detail_failure(&item, &e);
                    DetailInfo::default()
                }
            };

            advance(phase, CrawlPhase::Assembling)?;
            let record = match assemble(item, detail) {
                Ok(record) => record,
                Err(e) => {
                    summary.items_skipped += 1;
                    tracing::warn!("Skipping entry: {}", e);
                    continue;
                }
            };

            advance(phase, CrawlPhase::Persisting)?;
            match store.upsert(&record) {
                Ok(record_id) => {
                    summary.items_processed += 1;
                    tracing::info!(
                        record_id,
                        name = %record.name,
                        year = record.year,
                        link = %record.link,
                        patent = record.patent_number.as_deref().unwrap_or("-"),
                        "Stored variety"
                    );
                }
                Err(e) => {
                    summary.store_failures += 1;
                    tracing::error!(name = %record.name, "Failed to store variety: {}", e);
                }
            }
        }

        Ok(())
    }
}

fn log_detail_failure(item: &ListingItem, error: &FetchError) {
    tracing::warn!(
        name = %item.name,
        url = error.url(),
        "Detail page unavailable, storing entry without description: {}",
        error
    );
}

/// Moves the run to `next`, refusing edges the pipeline cannot take
fn advance(phase: &mut CrawlPhase, next: CrawlPhase) -> Result<(), HarvestError> {
    if !phase.can_transition_to(next) {
        return Err(HarvestError::InvalidTransition {
            from: *phase,
            to: next,
        });
    }

    tracing::trace!(from = %phase, to = %next, "Crawl phase transition");
    *phase = next;
    Ok(())
}

/// Runs a complete harvest against the configured registry and database
///
/// # Example
///
/// ```no_run
/// use cultivar_harvest::config::load_config_with_hash;
/// use cultivar_harvest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(None)?;
/// let summary = run_crawl(config, hash).await?;
/// println!("{} varieties stored", summary.items_processed);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: String) -> Result<RunSummary, HarvestError> {
    let mut coordinator = Coordinator::from_config(config, config_hash)?;
    coordinator.run().await
}
