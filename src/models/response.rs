//! Search results and dataset summaries

use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::request::SearchRequest;
use super::restaurant::{Cuisine, PriceRange, RestaurantRecord};

/// A restaurant in a result list together with its distance from the search
/// origin, when that can be computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRestaurant {
    pub restaurant: RestaurantRecord,
    /// Miles from the request origin
    pub distance: Option<f64>,
}

/// Outcome of one search call
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Ranked results, possibly truncated to a page
    pub results: Vec<RankedRestaurant>,
    /// Number of matching records before truncation
    pub total_count: usize,
    /// The request that was applied
    pub criteria: SearchRequest,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub generated_at: DateTime<Utc>,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl SearchResponse {
    /// The restaurants in rank order
    pub fn restaurants(&self) -> impl Iterator<Item = &RestaurantRecord> {
        self.results.iter().map(|r| &r.restaurant)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Display for SearchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Found {} restaurants near {} (showing {})",
            self.total_count,
            self.criteria.location,
            self.results.len()
        )?;
        for (rank, ranked) in self.results.iter().enumerate() {
            write!(f, "{:>3}. {}", rank + 1, ranked.restaurant)?;
            if let Some(distance) = ranked.distance {
                writeln!(f, "   📍 {distance:.1} mi away")?;
            }
        }
        Ok(())
    }
}

/// Aggregate statistics over a dataset snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_restaurants: usize,
    pub cuisines: BTreeMap<Cuisine, usize>,
    pub price_ranges: BTreeMap<PriceRange, usize>,
    pub average_rating: Option<f64>,
}

impl DataSummary {
    #[must_use]
    pub fn from_records(records: &[RestaurantRecord]) -> Self {
        let mut cuisines = BTreeMap::new();
        let mut price_ranges = BTreeMap::new();
        for record in records {
            *cuisines.entry(record.cuisine).or_insert(0) += 1;
            *price_ranges.entry(record.price_range).or_insert(0) += 1;
        }

        let average_rating = if records.is_empty() {
            None
        } else {
            Some(records.iter().map(|r| r.rating).sum::<f64>() / records.len() as f64)
        };

        Self {
            total_restaurants: records.len(),
            cuisines,
            price_ranges,
            average_rating,
        }
    }
}

impl Display for DataSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "📊 {} restaurants", self.total_restaurants)?;
        if let Some(avg) = self.average_rating {
            writeln!(f, "   Average rating: {avg:.2}")?;
        }
        writeln!(f, "   Cuisines:")?;
        for (cuisine, count) in &self.cuisines {
            writeln!(f, "     {cuisine:<14} {count}")?;
        }
        writeln!(f, "   Price ranges:")?;
        for (price, count) in &self.price_ranges {
            writeln!(f, "     {:<14} {count}", price.symbol())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RestaurantLocation;

    fn record(id: &str, cuisine: Cuisine, price: PriceRange, rating: f64) -> RestaurantRecord {
        RestaurantRecord::new(
            id,
            id.to_uppercase(),
            cuisine,
            price,
            rating,
            RestaurantLocation::new("1 Main St", None),
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record("a", Cuisine::Italian, PriceRange::Budget, 4.0),
            record("b", Cuisine::Italian, PriceRange::Luxury, 5.0),
            record("c", Cuisine::Thai, PriceRange::Budget, 3.0),
        ];
        let summary = DataSummary::from_records(&records);
        assert_eq!(summary.total_restaurants, 3);
        assert_eq!(summary.cuisines[&Cuisine::Italian], 2);
        assert_eq!(summary.price_ranges[&PriceRange::Budget], 2);
        assert_eq!(summary.average_rating, Some(4.0));
    }

    #[test]
    fn test_summary_of_empty_dataset() {
        let summary = DataSummary::from_records(&[]);
        assert_eq!(summary.total_restaurants, 0);
        assert_eq!(summary.average_rating, None);
        assert!(summary.cuisines.is_empty());
    }
}
