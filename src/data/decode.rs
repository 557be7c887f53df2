//! Decoding of dataset exports (CSV or JSON) into restaurant records
//!
//! Rows that cannot satisfy the record invariants (rating on the 0-5 scale,
//! a known price tier) are skipped and counted, never coerced.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::models::{Coordinates, Cuisine, PriceRange, RestaurantLocation, RestaurantRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// Pick the format from an object key's extension
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let extension = key.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(DatasetFormat::Csv),
            "json" => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

/// One row of the restaurant export. Every column is optional here; the
/// conversion decides what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRestaurant {
    id: Option<String>,
    name: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    phone: Option<String>,
    #[serde(alias = "cuisine")]
    cuisine_type: Option<String>,
    price_range: Option<String>,
    rating: Option<f64>,
    review_count: Option<u32>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    website: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl RawRestaurant {
    fn full_address(&self) -> String {
        let street = self.address.as_deref().map(str::trim).unwrap_or_default();
        let city = self.city.as_deref().map(str::trim).unwrap_or_default();
        let state_zip = [self.state.as_deref(), self.zip_code.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [street, city, state_zip.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn into_record(self, row: usize) -> Result<RestaurantRecord, String> {
        let address = self.full_address();
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        };

        let name = non_blank(self.name).ok_or("missing name")?;
        let id = non_blank(self.id).unwrap_or_else(|| format!("row-{row}"));
        let cuisine = self
            .cuisine_type
            .as_deref()
            .map_or(Cuisine::Other, Cuisine::classify);
        let price_text = non_blank(self.price_range).ok_or("missing price range")?;
        let price_range = PriceRange::from_token(&price_text)
            .ok_or_else(|| format!("unknown price range '{price_text}'"))?;
        let rating = self.rating.ok_or("missing rating")?;

        let mut record = RestaurantRecord::new(
            id,
            name,
            cuisine,
            price_range,
            rating,
            RestaurantLocation::new(address, coordinates),
        )
        .ok_or_else(|| format!("rating {rating} outside 0-5"))?;
        record.review_count = self.review_count;
        record.phone = non_blank(self.phone);
        record.website = non_blank(self.website);
        Ok(record)
    }
}

/// Records decoded from one export plus how many rows were dropped
#[derive(Debug, Default)]
pub struct DecodedDataset {
    pub records: Vec<RestaurantRecord>,
    pub skipped: usize,
}

impl DecodedDataset {
    fn push(&mut self, row: usize, raw: RawRestaurant) {
        match raw.into_record(row) {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                debug!("Skipping dataset row {}: {}", row, reason);
                self.skipped += 1;
            }
        }
    }
}

/// Decode an export. Structural errors (unreadable CSV, invalid JSON) fail
/// the whole payload; row-level problems only skip that row.
pub fn decode(bytes: &[u8], format: DatasetFormat) -> Result<DecodedDataset, ServiceError> {
    let mut dataset = DecodedDataset::default();

    match format {
        DatasetFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(bytes);
            for (row, result) in reader.deserialize::<RawRestaurant>().enumerate() {
                match result {
                    Ok(raw) => dataset.push(row, raw),
                    Err(e) if e.is_io_error() => {
                        return Err(ServiceError::Payload(format!("unreadable CSV: {e}")));
                    }
                    Err(e) => {
                        debug!("Skipping dataset row {}: {}", row, e);
                        dataset.skipped += 1;
                    }
                }
            }
        }
        DatasetFormat::Json => {
            let rows: Vec<RawRestaurant> = serde_json::from_slice(bytes)
                .map_err(|e| ServiceError::Payload(format!("invalid JSON dataset: {e}")))?;
            for (row, raw) in rows.into_iter().enumerate() {
                dataset.push(row, raw);
            }
        }
    }

    if dataset.skipped > 0 {
        warn!(
            "Skipped {} dataset rows that violate record invariants",
            dataset.skipped
        );
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,name,address,city,state,zip_code,phone,cuisine_type,price_range,rating,review_count,latitude,longitude,hours,website
1,Golden Dragon,123 Main St,Los Angeles,CA,90012,555-0100,\"Chinese, Dim Sum\",$$,4.5,120,34.0522,-118.2437,,
2,Luigi's,9 Pine St,Los Angeles,CA,90013,,Pizza,$,4.1,,,,,
3,Broken Stars,1 Nowhere,Los Angeles,CA,90014,,Thai,$$,7.5,,,,,
4,No Price,2 Nowhere,Los Angeles,CA,90014,,Thai,,4.0,,,,,
";

    #[test]
    fn test_decode_csv() {
        let dataset = decode(CSV.as_bytes(), DatasetFormat::Csv).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.skipped, 2);

        let dragon = &dataset.records[0];
        assert_eq!(dragon.id, "1");
        assert_eq!(dragon.cuisine, Cuisine::Chinese);
        assert_eq!(dragon.price_range, PriceRange::Moderate);
        assert_eq!(dragon.location.address, "123 Main St, Los Angeles, CA 90012");
        assert!(dragon.location.coordinates.is_some());
        assert_eq!(dragon.review_count, Some(120));

        let luigi = &dataset.records[1];
        assert_eq!(luigi.cuisine, Cuisine::Italian);
        assert_eq!(luigi.price_range, PriceRange::Budget);
        assert!(luigi.location.coordinates.is_none());
        assert_eq!(luigi.phone, None);
    }

    #[test]
    fn test_decode_json() {
        let json = r#"[
            {"name": "Taqueria Sol", "address": "5 Sun Ave", "cuisine": "Mexican",
             "price_range": "budget", "rating": 4.8, "latitude": 34.1, "longitude": -118.3},
            {"name": "Mystery", "price_range": "$$", "rating": 3.0}
        ]"#;
        let dataset = decode(json.as_bytes(), DatasetFormat::Json).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0].id, "row-0");
        assert_eq!(dataset.records[0].cuisine, Cuisine::Mexican);
        assert_eq!(dataset.records[1].cuisine, Cuisine::Other);
        assert_eq!(dataset.records[1].location.address, "");
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        assert!(matches!(
            decode(b"{not json", DatasetFormat::Json),
            Err(ServiceError::Payload(_))
        ));
    }

    #[test]
    fn test_format_from_key() {
        assert_eq!(
            DatasetFormat::from_key("Restaurants_in_LA_20250907.csv"),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(DatasetFormat::from_key("export.JSON"), Some(DatasetFormat::Json));
        assert_eq!(DatasetFormat::from_key("export"), None);
        assert_eq!(DatasetFormat::from_key("export.parquet"), None);
    }
}
