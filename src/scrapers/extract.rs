use crate::models::NormalizedRecord;
use crate::scrapers::types::SearchResultItem;
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Fields pulled out of a raw detail payload. Each group is extracted
/// independently so one broken marker never poisons the others.
#[derive(Debug, Default, PartialEq)]
pub struct DetailFields {
    pub property_type: Option<String>,
    pub postcode_district: Option<String>,
    pub outcode: Option<String>,
    pub postcode: Option<String>,
    pub acorn_type: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
}

/// Slice of `payload` between the first occurrence of `start` and the next
/// occurrence of `end` after it; runs to the end of the payload when `end`
/// never appears (embedded markers commonly sit on the last line).
fn between<'a>(payload: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = payload.find(start)? + start.len();
    let rest = &payload[from..];
    Some(rest.find(end).map_or(rest, |to| &rest[..to]))
}

/// Extract every field group from a detail payload. The markers live in
/// script-like structured text embedded in the page, not a documented API,
/// so each group falls back to absent rather than failing the record.
pub fn extract_detail_fields(payload: &str) -> DetailFields {
    let mut fields = DetailFields::default();

    // Postcode: both halves or nothing.
    let incode = between(payload, "\"incode\":\"", "\"");
    let outcode = between(payload, "\"outcode\":\"", "\"");
    if let (Some(incode), Some(outcode)) = (incode, outcode) {
        fields.postcode = Some(format!("{} {}", outcode, incode));
        fields.postcode_district = Some(incode.to_string());
        fields.outcode = Some(outcode.to_string());
    }

    // Geo: absent on any failure, never 0.0. Both halves or nothing.
    let lat = between(payload, "\"latitude\": ", ",").and_then(|s| s.trim().parse::<f64>().ok());
    let lon = between(payload, "\"longitude\": ", "\n").and_then(|s| s.trim().parse::<f64>().ok());
    if let (Some(lat), Some(lon)) = (lat, lon) {
        fields.latitude = Some(lat);
        fields.longitude = Some(lon);
    }

    fields.acorn_type =
        between(payload, "\"acornType\":", ",").and_then(|s| s.trim().parse::<i64>().ok());

    fields.property_type =
        between(payload, "\"propertyType\":\"", "\"").map(|s| s.to_string());

    fields.description = extract_description(payload);

    fields
}

/// Text of the page's features/description section, if the markup carries
/// one. Upstream markup changes are common; a missing section is a per-field
/// absence, not a failure.
fn extract_description(payload: &str) -> Option<String> {
    let document = Html::parse_document(payload);
    let selector = Selector::parse(r#"section[data-testid="page_features_section"]"#).unwrap();
    let section = document.select(&selector).next()?;
    let text = section.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Combine a detail payload with its search summary into one normalized
/// record. Fails only when the payload carries no propertyType marker, which
/// would break the record invariant; everything else degrades to absent.
pub fn build_record(
    payload: &str,
    item: &SearchResultItem,
    url: &str,
) -> Result<NormalizedRecord> {
    let fields = extract_detail_fields(payload);

    let property_type = fields
        .property_type
        .with_context(|| format!("No propertyType marker in payload for {}", url))?;

    let mut num_beds = None;
    let mut num_baths = None;
    let mut num_recepts = None;
    let mut extra_features = BTreeMap::new();
    for tag in &item.features {
        match tag.icon_id.as_str() {
            "bed" => num_beds = tag.content.trim().parse().ok(),
            "bath" => num_baths = tag.content.trim().parse().ok(),
            "chair" => num_recepts = tag.content.trim().parse().ok(),
            other => {
                extra_features.insert(other.to_string(), tag.content.clone());
            }
        }
    }

    // Redact the exact postcode from the display address, keeping the outcode
    // for general location.
    let display_address = match (&fields.postcode, &fields.outcode) {
        (Some(postcode), Some(outcode)) => item.address.replace(postcode, outcode),
        _ => item.address.clone(),
    };

    Ok(NormalizedRecord {
        property_type,
        price_display: item.price.clone(),
        postcode_district: fields.postcode_district,
        outcode: fields.outcode,
        postcode: fields.postcode,
        acorn_type: fields.acorn_type,
        display_address,
        num_beds,
        num_baths,
        num_recepts,
        extra_features,
        latitude: fields.latitude,
        longitude: fields.longitude,
        description: fields.description,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::types::{FeatureTag, ListingUris};

    fn sample_payload() -> String {
        concat!(
            "<html><body>",
            r#"<section data-testid="page_features_section">  Spacious garden flat. </section>"#,
            "<script>var data = {\"incode\":\"1AA\",\"outcode\":\"SW1A\",",
            "\"acornType\":17,\"propertyType\":\"flat\"};\n",
            "var geo = {\"latitude\": 51.5,\n\"longitude\": -0.14\n};",
            "</script></body></html>",
        )
        .to_string()
    }

    fn sample_item() -> SearchResultItem {
        SearchResultItem {
            listing_id: "61042132".to_string(),
            title: "Flat for sale".to_string(),
            price: "£250,000".to_string(),
            address: "SW1A 1AA, London".to_string(),
            features: vec![
                FeatureTag { icon_id: "bed".to_string(), content: "3".to_string() },
                FeatureTag { icon_id: "bath".to_string(), content: "1".to_string() },
                FeatureTag { icon_id: "chair".to_string(), content: "2".to_string() },
                FeatureTag { icon_id: "compass".to_string(), content: "SE".to_string() },
            ],
            listing_uris: ListingUris { detail: "/for-sale/details/61042132/".to_string() },
        }
    }

    #[test]
    fn extracts_all_field_groups() {
        let fields = extract_detail_fields(&sample_payload());
        assert_eq!(fields.property_type.as_deref(), Some("flat"));
        assert_eq!(fields.postcode.as_deref(), Some("SW1A 1AA"));
        assert_eq!(fields.postcode_district.as_deref(), Some("1AA"));
        assert_eq!(fields.outcode.as_deref(), Some("SW1A"));
        assert_eq!(fields.acorn_type, Some(17));
        assert_eq!(fields.latitude, Some(51.5));
        assert_eq!(fields.longitude, Some(-0.14));
        assert_eq!(fields.description.as_deref(), Some("Spacious garden flat."));
    }

    #[test]
    fn missing_geo_markers_yield_absent_not_zero() {
        let fields = extract_detail_fields("<html><body>no markers here</body></html>");
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.longitude, None);
    }

    #[test]
    fn unparseable_geo_yields_absent() {
        let payload = "{\"latitude\": not-a-number,\n\"longitude\": also-not\n}";
        let fields = extract_detail_fields(payload);
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.longitude, None);
    }

    #[test]
    fn postcode_requires_both_markers() {
        let fields = extract_detail_fields("{\"outcode\":\"SW1A\"}");
        assert_eq!(fields.postcode, None);
        assert_eq!(fields.postcode_district, None);
        assert_eq!(fields.outcode, None);
    }

    #[test]
    fn missing_description_section_is_absent_not_fatal() {
        let payload = "<html><body>{\"propertyType\":\"flat\"}</body></html>";
        let fields = extract_detail_fields(payload);
        assert_eq!(fields.description, None);
        assert_eq!(fields.property_type.as_deref(), Some("flat"));
    }

    #[test]
    fn longitude_marker_at_end_of_payload_still_parses() {
        let payload = "{\"latitude\": 51.5,\n\"longitude\": -0.14";
        let fields = extract_detail_fields(payload);
        assert_eq!(fields.longitude, Some(-0.14));
    }

    #[test]
    fn build_record_remaps_feature_tags_and_redacts_address() {
        let record = build_record(
            &sample_payload(),
            &sample_item(),
            "https://www.zoopla.co.uk/for-sale/details/61042132/",
        )
        .unwrap();
        assert_eq!(record.num_beds, Some(3));
        assert_eq!(record.num_baths, Some(1));
        assert_eq!(record.num_recepts, Some(2));
        assert_eq!(record.extra_features.get("compass").map(String::as_str), Some("SE"));
        assert_eq!(record.display_address, "SW1A, London");
        assert_eq!(record.property_type, "flat");
    }

    #[test]
    fn build_record_fails_without_property_type() {
        let item = sample_item();
        let err = build_record("<html></html>", &item, "https://example.test/1").unwrap_err();
        assert!(err.to_string().contains("propertyType"));
    }

    #[test]
    fn unparseable_feature_count_is_absent() {
        let mut item = sample_item();
        item.features[0].content = "three".to_string();
        let record = build_record(&sample_payload(), &item, "https://example.test/1").unwrap();
        assert_eq!(record.num_beds, None);
    }
}
