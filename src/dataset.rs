use crate::models::NormalizedRecord;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Final column order of the output table. Extra feature tags carried on the
/// record do not appear here and are dropped by the projection.
pub const COLUMNS: [&str; 16] = [
    "property_type",
    "price",
    "postcode_district",
    "num_baths",
    "postcode",
    "outcode",
    "acorn_type",
    "display_address",
    "num_recepts",
    "num_beds",
    "url",
    "listing_condition",
    "latitude",
    "longitude",
    "description",
    "date",
];

const LISTING_CONDITION: &str = "pre-owned";

/// Accumulates one record per listing id for the lifetime of a run. Owned by
/// the orchestrator and handed to `build` exactly once.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    records: BTreeMap<String, NormalizedRecord>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its listing id. A listing seen twice in one run
    /// keeps the latest record.
    pub fn insert(&mut self, listing_id: String, record: NormalizedRecord) {
        self.records.insert(listing_id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Project every record onto the fixed column order, stamped with the
    /// run's scrape date, deduplicated by full-row equality.
    pub fn build(&self, scrape_date: NaiveDate) -> FinalTable {
        let date = scrape_date.format("%Y-%m-%d").to_string();
        let mut rows = Vec::with_capacity(self.records.len());
        let mut seen = HashSet::new();
        for record in self.records.values() {
            let row = project_row(record, &date);
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }
        FinalTable { rows }
    }
}

/// One record as a row of display cells. Absent values become empty cells,
/// the uniform absent marker in the output format.
fn project_row(record: &NormalizedRecord, date: &str) -> Vec<String> {
    vec![
        record.property_type.clone(),
        normalize_price(&record.price_display).to_string(),
        opt_str(&record.postcode_district),
        opt_num(record.num_baths),
        opt_str(&record.postcode),
        opt_str(&record.outcode),
        record.acorn_type.map(|a| a.to_string()).unwrap_or_default(),
        record.display_address.clone(),
        opt_num(record.num_recepts),
        opt_num(record.num_beds),
        record.url.clone(),
        LISTING_CONDITION.to_string(),
        record.latitude.map(|v| v.to_string()).unwrap_or_default(),
        record.longitude.map(|v| v.to_string()).unwrap_or_default(),
        opt_str(&record.description),
        date.to_string(),
    ]
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_num(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Strip the currency symbol and thousands separators from a display price
/// and parse it as an integer. Unparseable prices coerce to 0, unlike the
/// geo and classification fields which stay absent.
pub fn normalize_price(display: &str) -> i64 {
    display
        .replace('£', "")
        .replace(',', "")
        .trim()
        .parse()
        .unwrap_or(0)
}

/// The built, ordered, deduplicated table, ready for serialization.
#[derive(Debug)]
pub struct FinalTable {
    rows: Vec<Vec<String>>,
}

impl FinalTable {
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Serialize the table to CSV with the fixed header.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(COLUMNS)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().context("Failed to flush output file")?;
        Ok(())
    }
}
