//! Smotrelka Search - Title search and consolidation

#![warn(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! The catalog index stores one row per provider-contributed title variant.
//! This crate turns a raw, duplicate-laden hit list from the full-text backend
//! into one enriched record per real-world title, with an index of which
//! provider can play which external identifier.

pub mod backends;
pub mod consolidation;
pub mod errors;
pub mod pagination;
pub mod registry;
pub mod service;
pub mod types;

// Re-export main types
pub use backends::{BackendQuery, BackendResponse, MeilisearchBackend, SearchBackend, SearchFilter, StaticBackend};
pub use consolidation::{ConsolidationStats, ProviderIndex, consolidate, consolidate_with_stats};
pub use errors::CatalogSearchError;
pub use pagination::{Page, paginate};
pub use registry::{ProviderKey, SourceRegistry};
pub use service::SearchService;
pub use types::{EnrichedRecord, IdentifierEntry, RawHit, SearchRequest, SearchResponse};

/// Convenience type alias for Results with CatalogSearchError.
pub type Result<T> = std::result::Result<T, CatalogSearchError>;
