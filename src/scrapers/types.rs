use serde::Deserialize;
use std::time::Duration;

/// One summary listing entry from a search results page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub listing_id: String,
    #[serde(default)]
    pub title: String,
    /// Display price string, e.g. "£350,000" or "POA".
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub features: Vec<FeatureTag>,
    pub listing_uris: ListingUris,
}

/// Generic feature tag attached to a search result. Known icon ids map to
/// semantic counts (bed, bath, chair); the rest ride along under their raw id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTag {
    pub icon_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUris {
    pub detail: String,
}

/// Run configuration for a scrape. No CLI flags or env vars back this; a run
/// is a single-shot batch with the defaults below.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Site root; detail paths from search results are joined onto this.
    pub site_url: String,
    /// GraphQL search endpoint.
    pub api_url: String,
    /// Property-type filters iterated in order, each paginated to exhaustion.
    pub property_types: Vec<String>,
    /// Attempts per detail page before the listing is skipped.
    pub max_detail_attempts: u32,
    /// Attempts per search page before the property type is abandoned.
    pub max_page_attempts: u32,
    /// First retry delay; doubles per attempt up to `retry_cap`.
    pub retry_base: Duration,
    pub retry_cap: Duration,
    /// Destination for the final table.
    pub output_path: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.zoopla.co.uk".to_string(),
            api_url: "https://api-graphql-lambda.prod.zoopla.co.uk/graphql".to_string(),
            property_types: [
                "farms_land",
                "semi_detached",
                "flats",
                "detached",
                "terraced",
                "bungalow",
                "park_home",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_detail_attempts: 5,
            max_page_attempts: 3,
            retry_base: Duration::from_secs(2),
            retry_cap: Duration::from_secs(60),
            output_path: "zoopla_data.csv".to_string(),
        }
    }
}

/// Exponential backoff delay for the given zero-based attempt, capped.
pub fn backoff_delay(config: &ScrapeConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    config.retry_base.saturating_mul(factor).min(config.retry_cap)
}
