/// Crawl phase definitions for tracking run progress
///
/// A run walks `Idle → FetchingListings → ParsingListing`, then loops over
/// `FetchingDetail → ExtractingDetail → Assembling → Persisting` for every entry of every page
/// before reaching `Done`. `Aborted` is entered when the run cannot continue.
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Run constructed, nothing fetched yet
    Idle,

    /// All listing pages are in flight
    FetchingListings,

    /// Turning one listing page into entry stubs
    ParsingListing,

    /// Waiting for an entry's detail page
    FetchingDetail,

    /// Pulling description and characteristics out of a detail page
    ExtractingDetail,

    /// Merging stub and detail into a record
    Assembling,

    /// Handing the record to the store
    Persisting,

    // ===== Terminal States =====
    /// Every page and entry has been handled
    Done,

    /// A listing fetch (or run bookkeeping) failed and the run stopped early
    Aborted,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Checks whether the pipeline can move from `self` to `next`
    ///
    /// An entry whose detail fetch failed goes straight from `FetchingDetail` to `Assembling`;
    /// an entry that fails validation leaves `Assembling` without being persisted.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if next == Aborted {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, FetchingListings)
                | (FetchingListings, ParsingListing)
                | (ParsingListing, ParsingListing)
                | (ParsingListing, FetchingDetail)
                | (ParsingListing, Done)
                | (FetchingDetail, ExtractingDetail)
                | (FetchingDetail, Assembling)
                | (ExtractingDetail, Assembling)
                | (Assembling, Persisting)
                | (Assembling, FetchingDetail)
                | (Assembling, ParsingListing)
                | (Assembling, Done)
                | (Persisting, FetchingDetail)
                | (Persisting, ParsingListing)
                | (Persisting, Done)
        )
    }

    /// Lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingListings => "fetching_listings",
            Self::ParsingListing => "parsing_listing",
            Self::FetchingDetail => "fetching_detail",
            Self::ExtractingDetail => "extracting_detail",
            Self::Assembling => "assembling",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
