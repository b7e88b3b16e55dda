//! URL handling module for Cultivar-Harvest
//!
//! Builds the registry's filtered listing URLs and resolves detail links found in listing markup.

use crate::config::RegistryConfig;
use crate::ConfigError;
use url::Url;

/// Filter fields the registry's search form always submits, empty unless noted
const EMPTY_FILTERS: &[&str] = &[
    "arrFilter_pf[SORT_NAME]",
    "arrFilter_pf[SORT_ID]",
    "arrFilter_pf[ALLOW_SUBJECTS_NAME]",
    "arrFilter_pf[ALLOW_ORIGINATORS_NAME]",
];

const CROP_FILTER: &str = "arrFilter_pf[CULTURE_NAME]";

/// Builds the listing URL with the crop filter applied but without a page number
///
/// # Examples
///
/// ```
/// use cultivar_harvest::config::RegistryConfig;
/// use cultivar_harvest::url::listing_base_url;
///
/// let url = listing_base_url(&RegistryConfig::default()).unwrap();
/// assert!(url.as_str().contains("set_filter=Y"));
/// ```
pub fn listing_base_url(config: &RegistryConfig) -> Result<Url, ConfigError> {
    let mut url = Url::parse(&config.listing_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid listing_url '{}': {}", config.listing_url, e))
    })?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair(CROP_FILTER, &config.crop_name);
        for filter in EMPTY_FILTERS {
            query.append_pair(filter, "");
        }
        query.append_pair("set_filter", "Y");
    }

    Ok(url)
}

/// Query parameters selecting one listing page
pub fn page_params(page_parameter: &str, page: u32) -> Vec<(String, String)> {
    vec![(page_parameter.to_string(), page.to_string())]
}

/// Builds the full URL of one listing page
pub fn listing_page_url(base: &Url, page_parameter: &str, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(page_parameter, &page.to_string());
    url
}

/// Parses the registry host that detail links are resolved against
pub fn registry_host(config: &RegistryConfig) -> Result<Url, ConfigError> {
    Url::parse(&config.host)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid host '{}': {}", config.host, e)))
}

/// Resolves a detail link href against the registry host
///
/// Returns None for hrefs that cannot point at a detail page:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: links
/// - anything that does not resolve to http(s)
pub fn resolve_detail_url(host: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = host.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Url {
        Url::parse("https://gossortrf.ru/").unwrap()
    }

    #[test]
    fn test_listing_base_url_carries_crop_filter() {
        let url = listing_base_url(&RegistryConfig::default()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(
            pairs[0],
            (
                "arrFilter_pf[CULTURE_NAME]".to_string(),
                "Картофель".to_string()
            )
        );
        assert!(pairs.contains(&("arrFilter_pf[SORT_ID]".to_string(), String::new())));
        assert_eq!(
            pairs.last(),
            Some(&("set_filter".to_string(), "Y".to_string()))
        );
        assert!(url.as_str().contains("arrFilter_pf%5BCULTURE_NAME%5D="));
    }

    #[test]
    fn test_listing_page_url_appends_page_number() {
        let base = listing_base_url(&RegistryConfig::default()).unwrap();
        let url = listing_page_url(&base, "PAGEN_1", 7);
        assert!(url.as_str().ends_with("&set_filter=Y&PAGEN_1=7"));
    }

    #[test]
    fn test_page_params() {
        assert_eq!(
            page_params("PAGEN_1", 3),
            vec![("PAGEN_1".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn test_resolve_root_relative_href() {
        let url = resolve_detail_url(&host(), "/registry/sort/12345/").unwrap();
        assert_eq!(url.as_str(), "https://gossortrf.ru/registry/sort/12345/");
    }

    #[test]
    fn test_resolve_absolute_href() {
        let url = resolve_detail_url(&host(), "https://gossortrf.ru/a/b").unwrap();
        assert_eq!(url.as_str(), "https://gossortrf.ru/a/b");
    }

    #[test]
    fn test_reject_unusable_hrefs() {
        assert!(resolve_detail_url(&host(), "").is_none());
        assert!(resolve_detail_url(&host(), "#top").is_none());
        assert!(resolve_detail_url(&host(), "javascript:void(0)").is_none());
        assert!(resolve_detail_url(&host(), "mailto:info@gossortrf.ru").is_none());
    }
}
