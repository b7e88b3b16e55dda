use serde::Deserialize;

/// Registry host that detail links are resolved against
pub const DEFAULT_HOST: &str = "https://gossortrf.ru/";

/// Listing page of volume 1 (plant varieties) of the state registry
pub const DEFAULT_LISTING_URL: &str = "https://gossortrf.ru/registry/gosudarstvennyy-reestr-selektsionnykh-dostizheniy-dopushchennykh-k-ispolzovaniyu-tom-1-sorta-rasteni/";

pub const DEFAULT_CROP_NAME: &str = "Картофель";

/// Query parameter the registry uses for its page number
pub const DEFAULT_PAGE_PARAMETER: &str = "PAGEN_1";

pub const DEFAULT_FIRST_PAGE: u32 = 1;
pub const DEFAULT_LAST_PAGE: u32 = 26;

/// The origin refuses to serve content unless these two headers look like a desktop browser.
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 YaBrowser/24.1.0.0 Safari/537.36";

pub const DEFAULT_DETAIL_CONCURRENCY: usize = 1;
pub const DEFAULT_DATABASE_PATH: &str = "./varieties.db";

/// Main configuration structure for Cultivar-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the registry lives and which slice of it to crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base that relative detail hrefs are resolved against
    pub host: String,

    /// Listing URL without its filter query
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Value of the crop-name filter
    #[serde(rename = "crop-name")]
    pub crop_name: String,

    /// Query parameter carrying the page number
    #[serde(rename = "page-parameter")]
    pub page_parameter: String,

    /// First listing page to fetch (inclusive)
    #[serde(rename = "first-page")]
    pub first_page: u32,

    /// Last listing page to fetch (inclusive)
    #[serde(rename = "last-page")]
    pub last_page: u32,

    /// Stop processing at the first listing page that yields no entries
    #[serde(rename = "stop-on-empty-page")]
    pub stop_on_empty_page: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            crop_name: DEFAULT_CROP_NAME.to_string(),
            page_parameter: DEFAULT_PAGE_PARAMETER.to_string(),
            first_page: DEFAULT_FIRST_PAGE,
            last_page: DEFAULT_LAST_PAGE,
            stop_on_empty_page: false,
        }
    }
}

impl RegistryConfig {
    /// Number of listing pages in the configured range
    pub fn page_count(&self) -> u32 {
        self.last_page.saturating_sub(self.first_page) + 1
    }
}

/// Header profile and timeouts for every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub accept: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds; no timeout when absent
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            connect_timeout_secs: None,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages in flight; 1 processes items strictly one at a time
    #[serde(rename = "detail-concurrency")]
    pub detail_concurrency: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}
