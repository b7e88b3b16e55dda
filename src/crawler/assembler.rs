//! Record assembly
//!
//! Merges a listing stub with its detail extraction and normalizes the inclusion year.

use crate::crawler::detail::DetailInfo;
use crate::crawler::listing::ListingItem;
use thiserror::Error;

/// Reasons an entry cannot become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Entry has no name")]
    MissingName,

    #[error("No digits in inclusion year '{raw}'")]
    MissingYear { raw: String },

    #[error("Inclusion year '{raw}' does not fit an integer year")]
    YearOutOfRange { raw: String },
}

/// A complete variety record ready for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CultivarRecord {
    pub name: String,
    pub year: i32,
    /// Detail page URL
    pub link: String,
    pub patent_number: Option<String>,
    pub description: String,
    /// Newline-separated characteristics
    pub characteristics: String,
}

/// Normalizes the inclusion year by discarding every non-digit character
///
/// # Examples
///
/// ```
/// use cultivar_harvest::crawler::parse_year;
///
/// assert_eq!(parse_year("2020 г.").unwrap(), 2020);
/// assert!(parse_year("не указан").is_err());
/// ```
pub fn parse_year(raw: &str) -> Result<i32, ValidationError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Err(ValidationError::MissingYear {
            raw: raw.to_string(),
        });
    }

    digits
        .parse::<i32>()
        .map_err(|_| ValidationError::YearOutOfRange {
            raw: raw.to_string(),
        })
}

/// Builds a record from a listing stub and its detail fields
pub fn assemble(item: ListingItem, detail: DetailInfo) -> Result<CultivarRecord, ValidationError> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }

    let year = parse_year(&item.year_raw)?;
    let characteristics = detail.characteristics_text();

    Ok(CultivarRecord {
        name: name.to_string(),
        year,
        link: item.detail_url,
        patent_number: item.patent_number,
        description: detail.description,
        characteristics,
    })
}
