use crate::scrapers::types::SearchResultItem;
use anyhow::Result;
use async_trait::async_trait;

/// Seam between the orchestration loop and the upstream platform.
/// The production implementation talks HTTP; tests substitute a stub.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page of summary listings for a property-type filter.
    ///
    /// `Ok(vec![])` means the pagination genuinely ran out; transport
    /// failures come back as `Err` so the caller can tell them apart.
    async fn search_page(&self, page: u32, property_type: &str) -> Result<Vec<SearchResultItem>>;

    /// Fetch the raw detail payload for a listing URL. Implementations retry
    /// internally; an `Err` means retries were exhausted.
    async fn fetch_detail(&self, url: &str) -> Result<String>;

    /// Name of the upstream source, for logging.
    fn source_name(&self) -> &'static str;
}
