//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the registry's fixed header profile
//! - GET requests returning page text
//! - Error classification into [`FetchError`]
//!
//! Requests are never retried here; callers decide what a failure means.

use crate::config::HttpConfig;
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Failure to retrieve a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }
}

/// Something that can turn a URL into page text
///
/// The crawler only ever talks to the registry through this trait, so tests can substitute
/// canned pages, injected latency or injected failures.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs one GET of `url` with `params` appended to its query string
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError>;
}

/// Builds an HTTP client with the configured header profile
///
/// The Accept list and User-Agent are sent verbatim on every request. No timeout is set
/// unless `timeout_secs` is configured.
///
/// # Example
///
/// ```no_run
/// use cultivar_harvest::config::HttpConfig;
/// use cultivar_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HarvestError> {
    let accept = HeaderValue::from_str(&config.accept)
        .map_err(|e| ConfigError::Validation(format!("Invalid accept header: {}", e)))?;
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| ConfigError::Validation(format!("Invalid user_agent header: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, accept);

    let mut builder = Client::builder()
        .default_headers(headers)
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true);

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

/// [`PageFetcher`] backed by a shared reqwest connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the crawler's failure kinds
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: format!("Connection failed: {}", error),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_timeouts() {
        let config = HttpConfig {
            timeout_secs: Some(20),
            connect_timeout_secs: Some(5),
            ..HttpConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_invalid_header_is_a_config_error() {
        let config = HttpConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpConfig::default()
        };
        assert!(matches!(
            build_http_client(&config),
            Err(HarvestError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_fetch_error_url() {
        let error = FetchError::Status {
            url: "https://gossortrf.ru/x".to_string(),
            status: 503,
        };
        assert_eq!(error.url(), "https://gossortrf.ru/x");
        assert_eq!(error.to_string(), "HTTP 503 for https://gossortrf.ru/x");
    }
}
