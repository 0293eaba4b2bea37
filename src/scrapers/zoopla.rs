use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::{backoff_delay, ScrapeConfig, SearchResultItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// GraphQL query for one search results page. Trimmed to the fields the
/// extractor consumes; the endpoint tolerates partial selections.
const SEARCH_QUERY: &str = "query getListingData($path: String!) {\
  searchResults(path: $path) {\
    listings {\
      regular {\
        listingId\
        title\
        price\
        address\
        features { content iconId }\
        listingUris { detail }\
      }\
    }\
  }\
}";

/// Zoopla scraper implementation.
pub struct ZooplaScraper {
    client: Client,
    config: ScrapeConfig,
}

impl ZooplaScraper {
    /// Create a scraper with default search parameters.
    pub fn new() -> Result<Self> {
        Self::with_config(ScrapeConfig::default())
    }

    /// Create a scraper with custom configuration.
    pub fn with_config(config: ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.insert("origin", HeaderValue::from_static("https://www.zoopla.co.uk"));
        headers.insert("referer", HeaderValue::from_static("https://www.zoopla.co.uk/"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_static("3Vzj2wUfaP3euLsV4NV9h3UAVUR3BoWd5clv9Dvu"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    async fn request_search_page(
        &self,
        page: u32,
        property_type: &str,
    ) -> Result<Vec<SearchResultItem>> {
        let path = format!(
            "/for-sale/property/england/?added=24_hours&property_type={}&pn={}",
            property_type, page
        );
        let body = json!({
            "operationName": "getListingData",
            "variables": { "path": path },
            "query": SEARCH_QUERY,
        });

        debug!("Fetching search page {} for {}", page, property_type);

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach search API")?;

        if !response.status().is_success() {
            anyhow::bail!("Search API returned status {}", response.status());
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search API response")?;

        Ok(parsed
            .data
            .and_then(|d| d.search_results)
            .and_then(|r| r.listings)
            .map(|l| l.regular)
            .unwrap_or_default())
    }
}

#[async_trait]
impl ListingSource for ZooplaScraper {
    async fn search_page(&self, page: u32, property_type: &str) -> Result<Vec<SearchResultItem>> {
        self.request_search_page(page, property_type).await
    }

    async fn fetch_detail(&self, url: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..self.config.max_detail_attempts {
            if attempt > 0 {
                let delay = backoff_delay(&self.config, attempt - 1);
                debug!("Retrying {} in {:?} (attempt {})", url, delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.context("Failed to read detail page body");
                }
                Ok(response) => {
                    warn!("Detail page {} returned status {}", url, response.status());
                    last_err = Some(anyhow::anyhow!("status {}", response.status()));
                }
                Err(e) => {
                    warn!("Transport failure on {}: {}", url, e);
                    last_err = Some(e.into());
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no attempts made"))).with_context(|| {
            format!(
                "Detail fetch exhausted {} attempts for {}",
                self.config.max_detail_attempts, url
            )
        })
    }

    fn source_name(&self) -> &'static str {
        "Zoopla"
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    search_results: Option<SearchResults>,
}

#[derive(Deserialize)]
struct SearchResults {
    listings: Option<ListingBuckets>,
}

#[derive(Deserialize)]
struct ListingBuckets {
    #[serde(default)]
    regular: Vec<SearchResultItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_missing_buckets() {
        let empty: SearchResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(empty.data.is_none());

        let no_listings: SearchResponse =
            serde_json::from_str(r#"{"data": {"searchResults": {"listings": null}}}"#).unwrap();
        let regular = no_listings
            .data
            .and_then(|d| d.search_results)
            .and_then(|r| r.listings)
            .map(|l| l.regular)
            .unwrap_or_default();
        assert!(regular.is_empty());
    }

    #[test]
    fn search_response_extracts_regular_listings() {
        let json = r#"{
            "data": {
                "searchResults": {
                    "listings": {
                        "regular": [{
                            "listingId": "1",
                            "price": "£100,000",
                            "address": "AB1 2CD, Leeds",
                            "features": [],
                            "listingUris": {"detail": "/for-sale/details/1/"}
                        }]
                    }
                }
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let regular = parsed
            .data
            .and_then(|d| d.search_results)
            .and_then(|r| r.listings)
            .map(|l| l.regular)
            .unwrap_or_default();
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].listing_id, "1");
    }
}
