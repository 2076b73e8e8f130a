//! Integration tests for Smotrelka
//!
//! These tests exercise the crates together: consolidation properties over
//! generated hit lists, the Meilisearch client against a local stub server,
//! and the HTTP API on top of the search service.

#[path = "integration/consolidation_properties.rs"]
mod consolidation_properties;

#[path = "integration/meilisearch_backend.rs"]
mod meilisearch_backend;

#[path = "integration/search_api.rs"]
mod search_api;
