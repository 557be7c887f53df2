//! Search request types: the caller's raw input, partially structured
//! fields, and the fully normalized `SearchRequest`

use serde::{Deserialize, Serialize};

use super::location::Coordinates;
use super::restaurant::{Cuisine, PriceRange, is_valid_rating};
use crate::error::{Result, SearchError};

/// Normalized, structured search criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-form or resolved location, never blank
    pub location: String,
    pub cuisine: Option<Cuisine>,
    pub price_range: Option<PriceRange>,
    /// Lower rating bound within [0, 5]
    pub rating_min: Option<f64>,
    /// Upper distance bound in miles
    pub max_distance: Option<f64>,
    /// Coordinates of `location`, when known
    pub origin: Option<Coordinates>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            cuisine: None,
            price_range: None,
            rating_min: None,
            max_distance: None,
            origin: None,
        }
    }

    #[must_use]
    pub fn with_cuisine(mut self, cuisine: Cuisine) -> Self {
        self.cuisine = Some(cuisine);
        self
    }

    #[must_use]
    pub fn with_price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = Some(price_range);
        self
    }

    #[must_use]
    pub fn with_rating_min(mut self, rating_min: f64) -> Self {
        self.rating_min = Some(rating_min);
        self
    }

    #[must_use]
    pub fn with_max_distance(mut self, miles: f64) -> Self {
        self.max_distance = Some(miles);
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Coordinates) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Check the numeric bounds a filter relies on
    pub fn validate(&self) -> Result<()> {
        check_rating_min(self.rating_min)?;
        check_max_distance(self.max_distance)?;
        check_origin(self.origin)?;
        Ok(())
    }

    /// First non-empty comma-separated segment of the location, e.g. "Boston"
    /// for "Boston, MA"
    #[must_use]
    pub fn primary_place(&self) -> &str {
        self.location
            .split(',')
            .map(str::trim)
            .find(|segment| !segment.is_empty())
            .unwrap_or_default()
    }
}

fn check_rating_min(rating_min: Option<f64>) -> Result<()> {
    match rating_min {
        Some(r) if !is_valid_rating(r) => Err(SearchError::invalid_request(format!(
            "rating_min must be between 0.0 and 5.0, got {r}"
        ))),
        _ => Ok(()),
    }
}

// Fields are public, so values built in code bypass `Coordinates::new`
fn check_origin(origin: Option<Coordinates>) -> Result<()> {
    match origin {
        Some(c) if Coordinates::new(c.latitude, c.longitude).is_none() => Err(
            SearchError::invalid_request(format!(
                "origin out of range: {}, {}",
                c.latitude, c.longitude
            )),
        ),
        _ => Ok(()),
    }
}

fn check_max_distance(max_distance: Option<f64>) -> Result<()> {
    match max_distance {
        Some(d) if !d.is_finite() || d < 0.0 => Err(SearchError::invalid_request(format!(
            "max_distance must be a non-negative number of miles, got {d}"
        ))),
        _ => Ok(()),
    }
}

/// Typed, possibly incomplete search fields. Produced both from the AI reply
/// and from caller overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRequest {
    pub location: Option<String>,
    pub cuisine: Option<Cuisine>,
    pub price_range: Option<PriceRange>,
    pub rating_min: Option<f64>,
    pub max_distance: Option<f64>,
    pub origin: Option<Coordinates>,
}

impl PartialRequest {
    /// Field-by-field merge where values in `self` win over `base`
    #[must_use]
    pub fn merge_over(self, base: PartialRequest) -> PartialRequest {
        PartialRequest {
            location: self.location.or(base.location),
            cuisine: self.cuisine.or(base.cuisine),
            price_range: self.price_range.or(base.price_range),
            rating_min: self.rating_min.or(base.rating_min),
            max_distance: self.max_distance.or(base.max_distance),
            origin: self.origin.or(base.origin),
        }
    }

    #[must_use]
    pub fn has_location(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.trim().is_empty())
    }

    /// Every filter field is set, so nothing is left for the AI to infer
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.has_location()
            && self.cuisine.is_some()
            && self.price_range.is_some()
            && self.rating_min.is_some()
            && self.max_distance.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == PartialRequest::default()
    }

    /// Turn into a `SearchRequest`; a missing location is a validation error
    pub fn into_request(self) -> Result<SearchRequest> {
        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| SearchError::validation("a location is required to search"))?;

        let request = SearchRequest {
            location,
            cuisine: self.cuisine,
            price_range: self.price_range,
            rating_min: self.rating_min,
            max_distance: self.max_distance,
            origin: self.origin,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Structured fields as supplied by a caller (CLI flags, HTTP body).
/// Enumerations arrive as strings and are checked by [`SearchOverrides::parse`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOverrides {
    pub location: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub rating_min: Option<f64>,
    pub max_distance: Option<f64>,
    pub origin: Option<Coordinates>,
}

impl SearchOverrides {
    /// Parse into typed fields; values outside the known domains are an
    /// `InvalidRequest`
    pub fn parse(&self) -> Result<PartialRequest> {
        let cuisine = self
            .cuisine
            .as_deref()
            .map(|c| c.parse::<Cuisine>().map_err(SearchError::invalid_request))
            .transpose()?;
        let price_range = self
            .price_range
            .as_deref()
            .map(|p| p.parse::<PriceRange>().map_err(SearchError::invalid_request))
            .transpose()?;
        check_rating_min(self.rating_min)?;
        check_max_distance(self.max_distance)?;
        check_origin(self.origin)?;

        Ok(PartialRequest {
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            cuisine,
            price_range,
            rating_min: self.rating_min,
            max_distance: self.max_distance,
            origin: self.origin,
        })
    }
}

/// What a caller hands to a search: free text, structured overrides, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchInput {
    pub query: Option<String>,
    pub overrides: SearchOverrides,
}

impl SearchInput {
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            overrides: SearchOverrides::default(),
        }
    }

    #[must_use]
    pub fn structured(overrides: SearchOverrides) -> Self {
        Self {
            query: None,
            overrides,
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: SearchOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The trimmed free-text query, if any
    #[must_use]
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
