//! Detail page extraction
//!
//! The registry renders a variety's free-text fields as `<li>` blocks introduced by a
//! localized label. The markup is not versioned, so extraction is lenient:
//! whatever cannot be found stays empty.

use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Label introducing the description block
pub const DESCRIPTION_MARKER: &str = "Описание:";

/// Label introducing the characteristics block
pub const CHARACTERISTICS_MARKER: &str = "Характеристики:";

/// Line separator inside the characteristics block, as serialized by the HTML parser
const LINE_BREAK: &str = "<br>";

/// Seeing this in a fragment means the split ran past the end of the block
const LIST_CLOSE: &str = "</li>";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<]+?>").expect("tag pattern is a valid regex"));

/// Free-text fields of one detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub description: String,

    /// One entry per line of the characteristics block
    pub characteristics: Vec<String>,
}

impl DetailInfo {
    /// Characteristics as stored: one line per characteristic
    pub fn characteristics_text(&self) -> String {
        self.characteristics.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.characteristics.is_empty()
    }
}

/// Extracts description and characteristics from a detail page
///
/// Every `<li>` is inspected in document order. A block mentioning [`DESCRIPTION_MARKER`]
/// becomes the description (marker removed); otherwise a block mentioning
/// [`CHARACTERISTICS_MARKER`] is split on line breaks into characteristics, label line
/// included. When several blocks match, the last one wins. Never fails.
///
/// # Example
///
/// ```
/// use cultivar_harvest::crawler::extract_detail;
///
/// let html = "<ul><li>Описание: Среднеранний сорт.</li>\
///             <li><b>Характеристики:</b><br>Урожайность высокая<br>Крахмал 14%</li></ul>";
/// let detail = extract_detail(html);
/// assert_eq!(detail.description, "Среднеранний сорт.");
/// assert_eq!(
///     detail.characteristics,
///     vec!["Характеристики:", "Урожайность высокая", "Крахмал 14%"]
/// );
/// ```
pub fn extract_detail(html: &str) -> DetailInfo {
    let mut detail = DetailInfo::default();

    let Ok(block_selector) = Selector::parse("li") else {
        return detail;
    };

    let document = Html::parse_document(html);

    for block in document.select(&block_selector) {
        let text: String = block.text().collect();

        if text.contains(DESCRIPTION_MARKER) {
            detail.description = text.replace(DESCRIPTION_MARKER, "").trim().to_string();
        } else if text.contains(CHARACTERISTICS_MARKER) {
            detail.characteristics = split_characteristics(&block.inner_html());
        }
    }

    detail
}

/// Splits the inner markup of a characteristics block into clean lines
fn split_characteristics(inner_html: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for fragment in inner_html.split(LINE_BREAK) {
        if fragment.contains(LIST_CLOSE) {
            break;
        }

        let stripped = TAG_PATTERN.replace_all(fragment, "");
        let line = decode_html_entities(&stripped).trim().to_string();

        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}
