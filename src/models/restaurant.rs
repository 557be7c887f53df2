//! Restaurant record and the closed cuisine / price enumerations

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::location::RestaurantLocation;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

/// Returns true if `rating` lies within the closed [0, 5] scale
#[must_use]
pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (RATING_MIN..=RATING_MAX).contains(&rating)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cuisine {
    American,
    Chinese,
    Italian,
    Mexican,
    Japanese,
    Indian,
    Thai,
    French,
    Mediterranean,
    Other,
}

impl Cuisine {
    pub const ALL: [Cuisine; 10] = [
        Cuisine::American,
        Cuisine::Chinese,
        Cuisine::Italian,
        Cuisine::Mexican,
        Cuisine::Japanese,
        Cuisine::Indian,
        Cuisine::Thai,
        Cuisine::French,
        Cuisine::Mediterranean,
        Cuisine::Other,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Cuisine::American => "american",
            Cuisine::Chinese => "chinese",
            Cuisine::Italian => "italian",
            Cuisine::Mexican => "mexican",
            Cuisine::Japanese => "japanese",
            Cuisine::Indian => "indian",
            Cuisine::Thai => "thai",
            Cuisine::French => "french",
            Cuisine::Mediterranean => "mediterranean",
            Cuisine::Other => "other",
        }
    }

    /// Cuisine names as they appear in dataset categories. `Other` lists
    /// cuisines outside the closed set.
    fn names(&self) -> &'static [&'static str] {
        match self {
            Cuisine::American => &["american"],
            Cuisine::Chinese => &["chinese"],
            Cuisine::Italian => &["italian"],
            Cuisine::Mexican => &["mexican"],
            Cuisine::Japanese => &["japanese"],
            Cuisine::Indian => &["indian"],
            Cuisine::Thai => &["thai"],
            Cuisine::French => &["french"],
            Cuisine::Mediterranean => &["mediterranean"],
            Cuisine::Other => &[
                "korean",
                "vietnamese",
                "ethiopian",
                "caribbean",
                "peruvian",
                "filipino",
                "hawaiian",
                "brazilian",
            ],
        }
    }

    /// Dish and style words that identify a cuisine in free text
    fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Cuisine::American => &["burger", "bbq", "barbecue", "diner", "steakhouse"],
            Cuisine::Chinese => &["dim sum", "szechuan", "sichuan", "cantonese"],
            Cuisine::Italian => &["pizza", "pasta", "trattoria"],
            Cuisine::Mexican => &["taco", "burrito", "taqueria"],
            Cuisine::Japanese => &["sushi", "ramen", "izakaya"],
            Cuisine::Indian => &["curry", "tandoori"],
            Cuisine::Thai => &["pad thai"],
            Cuisine::French => &["bistro", "brasserie"],
            Cuisine::Mediterranean => &["greek", "falafel", "lebanese"],
            Cuisine::Other => &[],
        }
    }

    /// Parse a single token such as "Italian" or "sushi"
    #[must_use]
    pub fn from_token(token: &str) -> Option<Cuisine> {
        let token = token.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == token || c.synonyms().contains(&token.as_str()))
    }

    /// Classify a free-text dataset category like "Pizza, Italian". A cuisine
    /// name wins over a dish word; among several names the one written first
    /// wins. Unknown categories fall into `Other`.
    #[must_use]
    pub fn classify(text: &str) -> Cuisine {
        let text = text.to_lowercase();
        let earliest = |words: fn(&Cuisine) -> &'static [&'static str]| {
            Self::ALL
                .into_iter()
                .filter_map(|c| {
                    let position = words(&c).iter().filter_map(|w| text.find(w)).min()?;
                    Some((position, c))
                })
                .min_by_key(|(position, _)| *position)
                .map(|(_, c)| c)
        };
        earliest(Cuisine::names)
            .or_else(|| earliest(Cuisine::synonyms))
            .unwrap_or(Cuisine::Other)
    }
}

impl FromStr for Cuisine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cuisine::from_token(s).ok_or_else(|| format!("unknown cuisine '{s}'"))
    }
}

impl Display for Cuisine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Cuisine::American => "American",
            Cuisine::Chinese => "Chinese",
            Cuisine::Italian => "Italian",
            Cuisine::Mexican => "Mexican",
            Cuisine::Japanese => "Japanese",
            Cuisine::Indian => "Indian",
            Cuisine::Thai => "Thai",
            Cuisine::French => "French",
            Cuisine::Mediterranean => "Mediterranean",
            Cuisine::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Ordinal price tier, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRange {
    Budget,
    Moderate,
    Expensive,
    #[serde(alias = "very_expensive")]
    Luxury,
}

impl PriceRange {
    pub const ALL: [PriceRange; 4] = [
        PriceRange::Budget,
        PriceRange::Moderate,
        PriceRange::Expensive,
        PriceRange::Luxury,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Budget => "budget",
            PriceRange::Moderate => "moderate",
            PriceRange::Expensive => "expensive",
            PriceRange::Luxury => "luxury",
        }
    }

    /// Dollar-sign notation used by the dataset
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Expensive => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }

    /// Parse a tier name, a common synonym or the dollar notation
    #[must_use]
    pub fn from_token(token: &str) -> Option<PriceRange> {
        let token = token.trim().to_lowercase().replace(['-', ' '], "_");
        match token.as_str() {
            "budget" | "cheap" | "inexpensive" | "$" => Some(PriceRange::Budget),
            "moderate" | "mid_range" | "midrange" | "affordable" | "$$" => {
                Some(PriceRange::Moderate)
            }
            "expensive" | "upscale" | "pricey" | "$$$" => Some(PriceRange::Expensive),
            "luxury" | "very_expensive" | "fine_dining" | "$$$$" => Some(PriceRange::Luxury),
            _ => None,
        }
    }
}

impl FromStr for PriceRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceRange::from_token(s).ok_or_else(|| format!("unknown price range '{s}'"))
    }
}

impl Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PriceRange::Budget => "Budget",
            PriceRange::Moderate => "Moderate",
            PriceRange::Expensive => "Expensive",
            PriceRange::Luxury => "Luxury",
        };
        f.write_str(name)
    }
}

/// A single restaurant from the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub id: String,
    pub name: String,
    pub cuisine: Cuisine,
    pub price_range: PriceRange,
    /// Always within [0.0, 5.0]
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: f64,
    pub location: RestaurantLocation,
    pub review_count: Option<u32>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

fn deserialize_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let rating = f64::deserialize(deserializer)?;
    if is_valid_rating(rating) {
        Ok(rating)
    } else {
        Err(serde::de::Error::custom(format!("rating {rating} outside 0-5")))
    }
}

impl RestaurantRecord {
    /// Build a record, returning `None` if the rating is off the 0-5 scale
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cuisine: Cuisine,
        price_range: PriceRange,
        rating: f64,
        location: RestaurantLocation,
    ) -> Option<Self> {
        if !is_valid_rating(rating) {
            return None;
        }
        Some(Self {
            id: id.into(),
            name: name.into(),
            cuisine,
            price_range,
            rating,
            location,
            review_count: None,
            phone: None,
            website: None,
        })
    }

    #[must_use]
    pub fn format_rating(&self) -> String {
        format!("{:.1}/5.0", self.rating)
    }
}

impl Display for RestaurantRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(
            f,
            "   🍽️ {} · {} · ⭐ {}",
            self.cuisine,
            self.price_range.symbol(),
            self.format_rating()
        )?;
        writeln!(f, "   🗺️ {}", self.location.address)?;
        if let Some(phone) = &self.phone {
            writeln!(f, "   📞 {phone}")?;
        }
        Ok(())
    }
}
