//! Listing page parser
//!
//! Turns one page of the registry's result list into entry stubs. Every entry is an
//! `<li id="...">` holding spans for the name, the patent number and the inclusion year,
//! plus a link to the entry's detail page.

use crate::url::resolve_detail_url;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One entry as shown on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Variety name, never empty
    pub name: String,

    /// Patent label, when the entry shows one
    pub patent_number: Option<String>,

    /// Absolute URL of the entry's detail page
    pub detail_url: String,

    /// Text after the "allowed since" label; usually the year, possibly with stray text
    pub year_raw: String,
}

/// Separator between the year label and its value, e.g. `Год включения в Госреестр: 2020`
const YEAR_LABEL_SEPARATOR: char = ':';

struct ListingSelectors {
    entry: Selector,
    name: Selector,
    patent: Selector,
    link: Selector,
    allowed: Selector,
}

impl ListingSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            entry: Selector::parse("li[id]").ok()?,
            name: Selector::parse("span.results__name").ok()?,
            patent: Selector::parse("span.results__patent").ok()?,
            link: Selector::parse("a[href]").ok()?,
            allowed: Selector::parse("span.results__allow").ok()?,
        })
    }
}

/// Parses a listing page into entry stubs, in document order
///
/// Malformed entries never fail the page:
/// - an entry without a name is skipped
/// - an entry without a usable detail link is skipped
/// - a missing patent label becomes `None`
/// - a missing year label becomes an empty `year_raw` (rejected later during assembly)
///
/// # Arguments
///
/// * `html` - The listing page markup
/// * `host` - The registry host detail links are resolved against
///
/// # Example
///
/// ```
/// use cultivar_harvest::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<ul><li id="bx_1">
///     <a href="/registry/sort/1/"><span class="results__name">Гала</span></a>
///     <span class="results__allow">Год включения в Госреестр: 2008</span>
/// </li></ul>"#;
/// let host = Url::parse("https://gossortrf.ru/").unwrap();
/// let items = parse_listing(html, &host);
/// assert_eq!(items[0].name, "Гала");
/// assert_eq!(items[0].year_raw, "2008");
/// ```
pub fn parse_listing(html: &str, host: &Url) -> Vec<ListingItem> {
    let Some(selectors) = ListingSelectors::new() else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for entry in document.select(&selectors.entry) {
        let Some(name) = first_text(entry, &selectors.name) else {
            tracing::debug!(
                entry_id = entry.value().id().unwrap_or_default(),
                "Skipping listing entry without a name"
            );
            continue;
        };

        let detail_url = entry
            .select(&selectors.link)
            .filter_map(|link| link.value().attr("href"))
            .find_map(|href| resolve_detail_url(host, href));

        let Some(detail_url) = detail_url else {
            tracing::debug!(name = %name, "Skipping listing entry without a detail link");
            continue;
        };

        let patent_number = first_text(entry, &selectors.patent);

        let year_raw = entry
            .select(&selectors.allowed)
            .next()
            .map(|label| year_from_label(&stripped_text(label)))
            .unwrap_or_default();

        items.push(ListingItem {
            name,
            patent_number,
            detail_url: detail_url.to_string(),
            year_raw,
        });
    }

    items
}

/// Keeps the segment of an "allowed since" label between its first and second separator
///
/// A label without a separator is kept whole so the year can still be recovered from it.
fn year_from_label(label: &str) -> String {
    let mut segments = label.split(YEAR_LABEL_SEPARATOR);
    let head = segments.next().unwrap_or_default();
    segments.next().unwrap_or(head).trim().to_string()
}

/// Text of the first matching descendant, trimmed; None when absent or blank
fn first_text(entry: ElementRef<'_>, selector: &Selector) -> Option<String> {
    entry
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Concatenates the element's text nodes with each one trimmed
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}
