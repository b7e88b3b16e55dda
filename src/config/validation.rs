use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, RegistryConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the detail worker pool
pub const MAX_DETAIL_CONCURRENCY: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_registry_config(&config.registry)?;
    validate_http_config(&config.http)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the registry location and page range
fn validate_registry_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    validate_http_url("host", &config.host)?;
    validate_http_url("listing_url", &config.listing_url)?;

    if config.crop_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crop_name cannot be empty".to_string(),
        ));
    }

    if config.page_parameter.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_parameter cannot be empty".to_string(),
        ));
    }

    if config.first_page < 1 {
        return Err(ConfigError::Validation(format!(
            "first_page must be >= 1, got {}",
            config.first_page
        )));
    }

    if config.last_page < config.first_page {
        return Err(ConfigError::Validation(format!(
            "last_page ({}) must not be smaller than first_page ({})",
            config.last_page, config.first_page
        )));
    }

    Ok(())
}

/// Validates the header profile and timeouts
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.accept.trim().is_empty() {
        return Err(ConfigError::Validation("accept cannot be empty".to_string()));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "timeout_secs must be > 0 when set".to_string(),
        ));
    }

    if config.connect_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.detail_concurrency < 1 || config.detail_concurrency > MAX_DETAIL_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "detail_concurrency must be between 1 and {}, got {}",
            MAX_DETAIL_CONCURRENCY, config.detail_concurrency
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a value parses as an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_page_range() {
        let mut config = Config::default();
        config.registry.first_page = 0;
        assert!(validate(&config).is_err());

        config.registry.first_page = 5;
        config.registry.last_page = 4;
        assert!(validate(&config).is_err());

        config.registry.last_page = 5;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_detail_concurrency() {
        let mut config = Config::default();
        config.crawler.detail_concurrency = 0;
        assert!(validate(&config).is_err());

        config.crawler.detail_concurrency = MAX_DETAIL_CONCURRENCY + 1;
        assert!(validate(&config).is_err());

        config.crawler.detail_concurrency = 4;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("host", "https://gossortrf.ru/").is_ok());
        assert!(validate_http_url("host", "http://127.0.0.1:8080").is_ok());

        assert!(validate_http_url("host", "").is_err());
        assert!(validate_http_url("host", "gossortrf.ru").is_err());
        assert!(validate_http_url("host", "ftp://gossortrf.ru/").is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = Some(0);
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }
}
