use chrono::Local;
use tracing::{error, info, Level};
use zoopla_harvester::dataset::DatasetBuilder;
use zoopla_harvester::pipeline;
use zoopla_harvester::scrapers::ZooplaScraper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 Zoopla Harvester");
    info!("===================");

    let scraper = ZooplaScraper::new()?;
    let config = scraper.config().clone();
    let scrape_date = Local::now().date_naive();

    let mut builder = DatasetBuilder::new();
    let outcome = pipeline::run(&scraper, &config, &mut builder).await;

    // On a fatal abort, report how far the run got and still flush whatever
    // was harvested rather than losing the batch.
    if let Err(e) = &outcome {
        error!(
            "Scrape aborted with {} record(s) harvested: {:#}",
            builder.len(),
            e
        );
    }

    let table = builder.build(scrape_date);
    table.write_csv(&config.output_path)?;
    info!("💾 Wrote {} row(s) to {}", table.rows().len(), config.output_path);

    outcome
}
