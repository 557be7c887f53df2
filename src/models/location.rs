//! Geographic coordinates and distance helpers

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create new coordinates, rejecting values outside the valid ranges
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to `other` in miles
    #[must_use]
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            haversine::Units::Miles,
        )
    }

    /// Format as "lat, lon" with four decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Unchecked wire shape; deserialization goes through `Coordinates::new`
#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = String;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.latitude, raw.longitude)
            .ok_or_else(|| format!("coordinates out of range: {}, {}", raw.latitude, raw.longitude))
    }
}

impl std::str::FromStr for Coordinates {
    type Err = String;

    /// Parse "lat,lon"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'lat,lon', got '{s}'"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
        Coordinates::new(lat, lon).ok_or_else(|| format!("coordinates out of range: {lat}, {lon}"))
    }
}

/// Where a restaurant is: its street address and, when known, its coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RestaurantLocation {
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

impl RestaurantLocation {
    #[must_use]
    pub fn new(address: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            address: address.into(),
            coordinates,
        }
    }

    /// Case-insensitive check whether the address mentions `place`
    #[must_use]
    pub fn mentions(&self, place: &str) -> bool {
        let place = place.trim().to_lowercase();
        !place.is_empty() && self.address.to_lowercase().contains(&place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range_check() {
        assert!(Coordinates::new(34.05, -118.24).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_distance_miles() {
        // Downtown LA to Santa Monica, roughly 14 miles
        let downtown = Coordinates::new(34.0522, -118.2437).unwrap();
        let santa_monica = Coordinates::new(34.0195, -118.4912).unwrap();
        let distance = downtown.distance_miles(&santa_monica);
        assert!(distance > 13.0 && distance < 16.0, "got {distance}");
    }

    #[test]
    fn test_parse_coordinates() {
        let c: Coordinates = "34.0522, -118.2437".parse().unwrap();
        assert_eq!(c.format_coordinates(), "34.0522, -118.2437");
        assert!("34.0".parse::<Coordinates>().is_err());
        assert!("north,south".parse::<Coordinates>().is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let ok: Coordinates = serde_json::from_str(r#"{"latitude": 34.05, "longitude": -118.24}"#).unwrap();
        assert_eq!(ok, Coordinates::new(34.05, -118.24).unwrap());

        let err = serde_json::from_str::<Coordinates>(r#"{"latitude": 500.0, "longitude": -900.0}"#).unwrap_err();
        assert!(err.to_string().contains("out of range"), "got {err}");
    }

    #[test]
    fn test_address_mentions() {
        let location = RestaurantLocation::new("123 Main St, Los Angeles, CA 90012", None);
        assert!(location.mentions("los angeles"));
        assert!(location.mentions(" Los Angeles "));
        assert!(!location.mentions("Boston"));
        assert!(!location.mentions(""));
    }
}
