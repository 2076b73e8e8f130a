//! HTTP request handlers organized by functionality

pub mod api;

// Re-export handler functions
pub use api::{ApiError, SearchQuery, api_health, api_providers, api_search};
