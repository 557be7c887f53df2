//! Restaurant finder - natural-language restaurant search
//!
//! A free-text request is normalized into structured criteria by an AI
//! completion service, then applied to a restaurant dataset fetched from an
//! object store. Results are filtered and ranked by rating and distance.

pub mod ai;
pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod data;
pub mod error;
pub mod filter;
pub mod geocoding;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod prompt;
pub mod web;

// Re-export core types for public API
pub use ai::{CompletionClient, GeminiClient};
pub use config::FinderConfig;
pub use coordinator::SearchCoordinator;
pub use data::{CachedSource, InMemorySource, ObjectStoreSource, RestaurantSource};
pub use error::{ErrorKind, SearchError, ServiceError};
pub use filter::RestaurantFilter;
pub use geocoding::{Geocoder, OpenMeteoGeocoder};
pub use models::{
    Coordinates, Cuisine, DataSummary, PriceRange, RestaurantRecord, SearchInput, SearchOverrides,
    SearchRequest, SearchResponse,
};
pub use normalizer::RequestNormalizer;
pub use prompt::{PromptExample, PromptTemplate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SearchError>;
