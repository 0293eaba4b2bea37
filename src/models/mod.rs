use std::collections::BTreeMap;

/// One normalized row of the final dataset, produced once per listing by the
/// field extractor and immutable thereafter.
///
/// `url` and `property_type` are always present; everything else is
/// best-effort. Numeric fields are `None` when the source payload is missing
/// or unparseable — never zero, since 0 is a valid coordinate/count. The
/// price stays a display string here and is normalized at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub property_type: String,
    pub price_display: String,
    pub postcode_district: Option<String>,
    pub outcode: Option<String>,
    pub postcode: Option<String>,
    pub acorn_type: Option<i64>,
    pub display_address: String,
    pub num_beds: Option<u32>,
    pub num_baths: Option<u32>,
    pub num_recepts: Option<u32>,
    /// Feature tags whose iconId is not one of the known remappings, carried
    /// verbatim until the final column projection drops them.
    pub extra_features: BTreeMap<String, String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub url: String,
}
