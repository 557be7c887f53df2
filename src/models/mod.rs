//! Data models for the restaurant finder
//!
//! - Location: coordinates, distances and restaurant addresses
//! - Restaurant: dataset records and the closed cuisine / price enumerations
//! - Request: raw caller input, partial fields and the normalized request
//! - Response: ranked results and dataset summaries

pub mod location;
pub mod request;
pub mod response;
pub mod restaurant;

// Re-export all public types for convenient access
pub use location::{Coordinates, RestaurantLocation};
pub use request::{PartialRequest, SearchInput, SearchOverrides, SearchRequest};
pub use response::{DataSummary, RankedRestaurant, SearchResponse};
pub use restaurant::{Cuisine, PriceRange, RestaurantRecord};
