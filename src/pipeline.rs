use crate::dataset::DatasetBuilder;
use crate::scrapers::extract::build_record;
use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::{backoff_delay, ScrapeConfig, SearchResultItem};
use anyhow::Result;
use std::io::Write;
use tracing::{info, warn};

/// Walk every property type page by page, harvesting each listing into the
/// builder. Fully sequential; per-listing failures are logged and skipped so
/// a single broken listing never aborts the run.
pub async fn run(
    source: &dyn ListingSource,
    config: &ScrapeConfig,
    builder: &mut DatasetBuilder,
) -> Result<()> {
    info!("Starting {} scrape", source.source_name());

    for property_type in &config.property_types {
        let mut page = 1;
        loop {
            let items = match search_with_retry(source, config, page, property_type).await {
                Some(items) => items,
                None => {
                    warn!(
                        "Abandoning {} after repeated search failures on page {}",
                        property_type, page
                    );
                    break;
                }
            };
            if items.is_empty() {
                info!("Completed {} after {} page(s)", property_type, page - 1);
                break;
            }

            info!("Scraping page {} of {} ({} listings)", page, property_type, items.len());
            for item in &items {
                harvest_listing(source, config, builder, item).await;
            }
            println!();
            page += 1;
        }
    }

    Ok(())
}

/// Fetch one search page, retrying transport failures a bounded number of
/// times. `Some(vec![])` is genuine end-of-pagination; `None` means the page
/// could not be fetched at all.
async fn search_with_retry(
    source: &dyn ListingSource,
    config: &ScrapeConfig,
    page: u32,
    property_type: &str,
) -> Option<Vec<SearchResultItem>> {
    for attempt in 0..config.max_page_attempts {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(config, attempt - 1)).await;
        }
        match source.search_page(page, property_type).await {
            Ok(items) => return Some(items),
            Err(e) => {
                warn!(
                    "Search page {} for {} failed (attempt {}): {:#}",
                    page,
                    property_type,
                    attempt + 1,
                    e
                );
            }
        }
    }
    None
}

/// Fetch, extract and store one listing. Progress is a single dot on stdout.
async fn harvest_listing(
    source: &dyn ListingSource,
    config: &ScrapeConfig,
    builder: &mut DatasetBuilder,
    item: &SearchResultItem,
) {
    let url = format!("{}{}", config.site_url, item.listing_uris.detail);

    let payload = match source.fetch_detail(&url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Skipping listing {}: {:#}", item.listing_id, e);
            return;
        }
    };

    match build_record(&payload, item, &url) {
        Ok(record) => {
            builder.insert(item.listing_id.clone(), record);
            print!(".");
            let _ = std::io::stdout().flush();
        }
        Err(e) => warn!("Skipping listing {}: {:#}", item.listing_id, e),
    }
}
