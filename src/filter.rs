//! Restaurant filtering and ranking
//!
//! Applies a [`SearchRequest`] to a restaurant collection. Predicates are
//! conjunctive and checked in a fixed order (location, cuisine, price,
//! rating). Survivors are ranked by rating, then by distance from the
//! request origin.

use std::cmp::Ordering;
use std::time::Instant;

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::models::{Cuisine, RankedRestaurant, RestaurantRecord, SearchRequest, SearchResponse};

/// Pure filter over an in-memory collection
pub struct RestaurantFilter;

impl RestaurantFilter {
    /// Filter and rank `universe`, returning every match
    pub fn filter(request: &SearchRequest, universe: &[RestaurantRecord]) -> Result<SearchResponse> {
        Self::filter_page(request, universe, None)
    }

    /// Filter and rank `universe`, keeping at most `limit` results.
    /// `total_count` always reflects the full number of matches.
    pub fn filter_page(
        request: &SearchRequest,
        universe: &[RestaurantRecord],
        limit: Option<usize>,
    ) -> Result<SearchResponse> {
        request.validate()?;
        let start = Instant::now();

        let mut matches: Vec<RankedRestaurant> = universe
            .iter()
            .filter_map(|record| {
                let distance = Self::distance_to(request, record);
                Self::matches(request, record, distance).then(|| RankedRestaurant {
                    restaurant: record.clone(),
                    distance,
                })
            })
            .collect();

        // stable: ties with no distance keep input order
        matches.sort_by(Self::rank);

        let total_count = matches.len();
        if let Some(limit) = limit {
            matches.truncate(limit);
        }

        debug!(
            "Filtered {} records down to {} matches (returning {})",
            universe.len(),
            total_count,
            matches.len()
        );

        Ok(SearchResponse {
            results: matches,
            total_count,
            criteria: request.clone(),
            elapsed: start.elapsed(),
            generated_at: Utc::now(),
        })
    }

    /// First record with the given id
    #[must_use]
    pub fn by_id<'a>(universe: &'a [RestaurantRecord], id: &str) -> Option<&'a RestaurantRecord> {
        universe.iter().find(|record| record.id == id)
    }

    /// The `limit` best-rated records, more reviews first on equal ratings.
    /// A missing review count sorts as zero.
    #[must_use]
    pub fn popular(universe: &[RestaurantRecord], limit: usize) -> Vec<RestaurantRecord> {
        let mut ranked: Vec<&RestaurantRecord> = universe.iter().collect();
        ranked.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| b.review_count.unwrap_or(0).cmp(&a.review_count.unwrap_or(0)))
        });
        ranked.into_iter().take(limit).cloned().collect()
    }

    /// The first `limit` records of one cuisine, in dataset order
    #[must_use]
    pub fn by_cuisine(universe: &[RestaurantRecord], cuisine: Cuisine, limit: usize) -> Vec<RestaurantRecord> {
        universe
            .iter()
            .filter(|record| record.cuisine == cuisine)
            .take(limit)
            .cloned()
            .collect()
    }

    fn matches(request: &SearchRequest, record: &RestaurantRecord, distance: Option<f64>) -> bool {
        Self::matches_location(request, record, distance)
            && request.cuisine.is_none_or(|c| record.cuisine == c)
            && request.price_range.is_none_or(|p| record.price_range == p)
            && request.rating_min.is_none_or(|min| record.rating >= min)
    }

    /// Without `max_distance` there is no geographic filtering. With it, a
    /// known origin means a radius check (records without coordinates are
    /// out); an unknown origin falls back to matching the place name in the
    /// address.
    fn matches_location(
        request: &SearchRequest,
        record: &RestaurantRecord,
        distance: Option<f64>,
    ) -> bool {
        let Some(max_distance) = request.max_distance else {
            return true;
        };
        match request.origin {
            Some(_) => distance.is_some_and(|d| d <= max_distance),
            None => record.location.mentions(request.primary_place()),
        }
    }

    fn distance_to(request: &SearchRequest, record: &RestaurantRecord) -> Option<f64> {
        let origin = request.origin?;
        let coordinates = record.location.coordinates?;
        Some(origin.distance_miles(&coordinates))
    }

    /// Rating descending, then known distances ascending, unknown distances last
    fn rank(a: &RankedRestaurant, b: &RankedRestaurant) -> Ordering {
        b.restaurant
            .rating
            .total_cmp(&a.restaurant.rating)
            .then_with(|| match (a.distance, b.distance) {
                (Some(da), Some(db)) => da.total_cmp(&db),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::models::{Coordinates, Cuisine, PriceRange, RestaurantLocation};

    fn restaurant(id: &str, cuisine: Cuisine, rating: f64) -> RestaurantRecord {
        RestaurantRecord::new(
            id,
            format!("Restaurant {id}"),
            cuisine,
            PriceRange::Moderate,
            rating,
            RestaurantLocation::new("100 Main St, Boston, MA", None),
        )
        .unwrap()
    }

    fn at(mut record: RestaurantRecord, lat: f64, lon: f64) -> RestaurantRecord {
        record.location.coordinates = Coordinates::new(lat, lon);
        record
    }

    fn ids(response: &SearchResponse) -> Vec<&str> {
        response.restaurants().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_cuisine_filter_keeps_stable_order() {
        let universe = vec![
            restaurant("A", Cuisine::Italian, 4.2),
            restaurant("B", Cuisine::Chinese, 4.8),
            restaurant("C", Cuisine::Italian, 4.2),
        ];
        let request = SearchRequest::new("Boston").with_cuisine(Cuisine::Italian);

        let response = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(ids(&response), vec!["A", "C"]);
        assert_eq!(response.total_count, 2);
    }

    #[test]
    fn test_empty_universe() {
        let request = SearchRequest::new("Boston").with_rating_min(4.0);
        let response = RestaurantFilter::filter(&request, &[]).unwrap();
        assert_eq!(response.total_count, 0);
        assert!(response.is_empty());
    }

    #[test]
    fn test_rejects_rating_above_scale() {
        let request = SearchRequest::new("Boston").with_rating_min(5.5);
        let err = RestaurantFilter::filter(&request, &[]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidRequest { .. }));
    }

    #[test]
    fn test_sorted_by_rating_descending() {
        let universe = vec![
            restaurant("low", Cuisine::Thai, 3.1),
            restaurant("high", Cuisine::Thai, 4.9),
            restaurant("mid", Cuisine::Thai, 4.0),
        ];
        let response = RestaurantFilter::filter(&SearchRequest::new("Boston"), &universe).unwrap();
        assert_eq!(ids(&response), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_rating_min_and_price_filters() {
        let mut cheap = restaurant("cheap", Cuisine::Mexican, 4.5);
        cheap.price_range = PriceRange::Budget;
        let universe = vec![
            cheap,
            restaurant("moderate", Cuisine::Mexican, 4.7),
            restaurant("poor", Cuisine::Mexican, 2.0),
        ];
        let request = SearchRequest::new("Boston")
            .with_price_range(PriceRange::Moderate)
            .with_rating_min(4.0);
        let response = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(ids(&response), vec!["moderate"]);
    }

    #[test]
    fn test_radius_excludes_far_and_unlocated_records() {
        let origin = Coordinates::new(42.3601, -71.0589).unwrap(); // Boston
        let universe = vec![
            at(restaurant("near", Cuisine::Italian, 4.0), 42.3656, -71.0096), // ~2.5 mi
            at(restaurant("far", Cuisine::Italian, 4.0), 41.8240, -71.4128),  // Providence
            restaurant("unknown", Cuisine::Italian, 4.0),
        ];
        let request = SearchRequest::new("Boston")
            .with_origin(origin)
            .with_max_distance(10.0);
        let response = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(ids(&response), vec!["near"]);
        let distance = response.results[0].distance.unwrap();
        assert!(distance > 1.5 && distance < 3.5, "got {distance}");
    }

    #[test]
    fn test_equal_ratings_ordered_by_distance_then_input_order() {
        let origin = Coordinates::new(42.3601, -71.0589).unwrap();
        let universe = vec![
            restaurant("no-coords-1", Cuisine::Thai, 4.5),
            at(restaurant("further", Cuisine::Thai, 4.5), 42.40, -71.10),
            restaurant("no-coords-2", Cuisine::Thai, 4.5),
            at(restaurant("closer", Cuisine::Thai, 4.5), 42.361, -71.059),
            at(restaurant("best", Cuisine::Thai, 4.9), 42.50, -71.30),
        ];
        let request = SearchRequest::new("Boston").with_origin(origin);
        let response = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(
            ids(&response),
            vec!["best", "closer", "further", "no-coords-1", "no-coords-2"]
        );
    }

    #[test]
    fn test_distance_without_origin_matches_place_name() {
        let mut elsewhere = restaurant("elsewhere", Cuisine::Thai, 4.0);
        elsewhere.location.address = "9 Elm St, Cambridge, MA".to_string();
        let universe = vec![restaurant("boston", Cuisine::Thai, 4.0), elsewhere];
        let request = SearchRequest::new("Boston, MA").with_max_distance(5.0);
        let response = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(ids(&response), vec!["boston"]);
    }

    #[test]
    fn test_no_max_distance_means_no_geographic_filter() {
        let mut elsewhere = restaurant("elsewhere", Cuisine::Thai, 4.0);
        elsewhere.location.address = "9 Elm St, Cambridge, MA".to_string();
        let response =
            RestaurantFilter::filter(&SearchRequest::new("Boston"), &[elsewhere]).unwrap();
        assert_eq!(response.total_count, 1);
    }

    #[test]
    fn test_limit_truncates_results_but_not_total() {
        let universe: Vec<_> = (0..5)
            .map(|i| restaurant(&format!("r{i}"), Cuisine::French, 4.0))
            .collect();
        let request = SearchRequest::new("Boston");
        let response = RestaurantFilter::filter_page(&request, &universe, Some(2)).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.total_count, 5);
    }

    #[test]
    fn test_by_id() {
        let universe = vec![restaurant("a", Cuisine::Thai, 4.0), restaurant("b", Cuisine::Thai, 3.0)];
        assert_eq!(RestaurantFilter::by_id(&universe, "b").map(|r| r.rating), Some(3.0));
        assert!(RestaurantFilter::by_id(&universe, "zzz").is_none());
    }

    #[test]
    fn test_popular_breaks_rating_ties_by_review_count() {
        let mut few = restaurant("few", Cuisine::Thai, 4.5);
        few.review_count = Some(10);
        let mut many = restaurant("many", Cuisine::Thai, 4.5);
        many.review_count = Some(900);
        let unknown = restaurant("unknown", Cuisine::Thai, 4.5);
        let universe = vec![few, restaurant("top", Cuisine::Thai, 4.9), unknown, many];

        let popular = RestaurantFilter::popular(&universe, 3);
        let ids: Vec<&str> = popular.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["top", "many", "few"]);
        assert!(RestaurantFilter::popular(&universe, 0).is_empty());
    }

    #[test]
    fn test_by_cuisine_keeps_dataset_order() {
        let universe = vec![
            restaurant("i1", Cuisine::Italian, 3.0),
            restaurant("t1", Cuisine::Thai, 5.0),
            restaurant("i2", Cuisine::Italian, 4.9),
            restaurant("i3", Cuisine::Italian, 4.0),
        ];
        let italian = RestaurantFilter::by_cuisine(&universe, Cuisine::Italian, 2);
        let ids: Vec<&str> = italian.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i2"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let universe = vec![
            restaurant("x", Cuisine::Indian, 4.0),
            restaurant("y", Cuisine::Indian, 4.0),
            restaurant("z", Cuisine::Indian, 4.6),
        ];
        let request = SearchRequest::new("Boston").with_cuisine(Cuisine::Indian);
        let first = RestaurantFilter::filter(&request, &universe).unwrap();
        let second = RestaurantFilter::filter(&request, &universe).unwrap();
        assert_eq!(first.results, second.results);
    }
}
