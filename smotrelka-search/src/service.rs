//! Consolidating search service
//!
//! Fetches an over-sized raw window from the backend, folds duplicate
//! provider rows into one record per title and pages over the result.

use std::sync::Arc;

use smotrelka_core::{SearchConfig, SmotrelkaConfig};
use tracing::{debug, info, warn};

use crate::backends::{BackendQuery, MeilisearchBackend, SearchBackend, SearchFilter};
use crate::consolidation::consolidate_with_stats;
use crate::errors::CatalogSearchError;
use crate::pagination::paginate;
use crate::types::{SearchRequest, SearchResponse};

/// Search service returning consolidated titles.
///
/// Cheap to clone and safe to share between concurrent requests; each call
/// consolidates its own hit list and keeps no state between calls.
#[derive(Debug, Clone)]
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    config: SearchConfig,
}

impl SearchService {
    /// Creates a service over any backend.
    pub fn new(backend: Arc<dyn SearchBackend>, config: SearchConfig) -> Self {
        Self { backend, config }
    }

    /// Creates a service talking to the configured Meilisearch instance.
    ///
    /// # Errors
    /// - `CatalogSearchError::InvalidConfiguration` - Backend client could not be built
    pub fn from_config(config: &SmotrelkaConfig) -> Result<Self, CatalogSearchError> {
        let backend = MeilisearchBackend::from_config(&config.backend)?;
        Ok(Self::new(Arc::new(backend), config.search.clone()))
    }

    /// Paging settings in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches the catalog and returns one page of consolidated titles.
    ///
    /// A blank query returns an empty response without contacting the
    /// backend. Filters are passed to the backend, paging applies to the
    /// consolidated list.
    ///
    /// # Errors
    /// - `CatalogSearchError::BackendUnavailable` - Backend could not be reached
    /// - `CatalogSearchError::BackendError` - Backend answered with an error status
    /// - `CatalogSearchError::MalformedResponse` - Backend answer could not be parsed
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CatalogSearchError> {
        let query = request.query.trim();
        if query.is_empty() {
            debug!("Blank query, skipping backend");
            return Ok(SearchResponse::empty());
        }

        let limit = request
            .limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1));
        let offset = request.offset.unwrap_or(0);

        let backend_query = BackendQuery {
            query: query.to_string(),
            limit: self.config.raw_fetch_window(offset.saturating_add(limit)),
            offset: 0,
            filter: SearchFilter::new(&request.providers, &request.categories),
        };

        let response = self.backend.search(&backend_query).await.map_err(|e| {
            warn!(query, error = %e, "Search backend failed");
            e
        })?;

        let raw_hits = response.hits.len();
        // A full window with more rows behind it may hide further titles
        let truncated = raw_hits >= backend_query.limit
            && response
                .estimated_total_hits
                .is_some_and(|backend_total| backend_total > raw_hits);

        let (records, stats) = consolidate_with_stats(response.hits);
        let total = records.len();
        let page = paginate(records, offset, limit);
        let has_more = page.has_more || (truncated && !page.hits.is_empty());

        info!(
            query,
            raw_hits,
            raw_window = backend_query.limit,
            classes = total,
            unrecognized_providers = stats.unrecognized_providers,
            returned = page.hits.len(),
            truncated,
            has_more,
            "Search completed"
        );

        Ok(SearchResponse {
            hits: page.hits,
            has_more,
            estimated_total_hits: Some(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::backends::{BackendResponse, StaticBackend};
    use crate::types::RawHit;

    /// Backend recording the queries it receives.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        inner: StaticBackend,
        seen: Mutex<Vec<BackendQuery>>,
    }

    #[async_trait]
    impl SearchBackend for RecordingBackend {
        async fn search(&self, query: &BackendQuery) -> Result<BackendResponse, CatalogSearchError> {
            self.seen.lock().unwrap().push(query.clone());
            self.inner.search(query).await
        }
    }

    #[derive(Debug)]
    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn search(&self, _query: &BackendQuery) -> Result<BackendResponse, CatalogSearchError> {
            Err(CatalogSearchError::BackendError {
                status: 503,
                body: "down".to_string(),
            })
        }
    }

    fn catalog() -> Vec<RawHit> {
        serde_json::from_value(json!([
            {"id": 1, "title_en": "Dune", "year": 2021, "provider": "kodik", "imdb_id": "tt1160419"},
            {"id": 2, "title_en": "Dune", "year": 2021, "provider": "turbo", "kinopoisk_id": 409424},
            {"id": 3, "title_en": "Dune", "year": 2021, "provider": "lumex", "imdb_id": "tt1160419", "kinopoisk_id": "409424"},
            {"id": 4, "title_en": "Dune", "year": 1984, "provider": "kodik", "imdb_id": "tt0087182"},
            {"id": 5, "title_en": "Dune: Part Two", "year": 2024, "provider": "flixcdn", "imdb_id": "tt15239678"},
            {"id": 6, "title_en": "Dune: Part Two", "year": 2024, "provider": "turbo/4k", "imdb_id": "tt15239678"}
        ]))
        .unwrap()
    }

    fn recording_service() -> (SearchService, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend {
            inner: StaticBackend::new(catalog()),
            seen: Mutex::new(Vec::new()),
        });
        let service = SearchService::new(backend.clone(), SearchConfig::default());
        (service, backend)
    }

    #[tokio::test]
    async fn test_blank_query_skips_backend() {
        let (service, backend) = recording_service();

        let response = service.search(&SearchRequest::new("   ")).await.unwrap();

        assert_eq!(response, SearchResponse::empty());
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_consolidates_and_counts_classes() {
        let (service, _) = recording_service();

        let response = service.search(&SearchRequest::new("dune")).await.unwrap();

        assert_eq!(response.estimated_total_hits, Some(3));
        assert!(!response.has_more);
        let ids: Vec<u64> = response.hits.iter().map(|r| r.hit.id).collect();
        assert_eq!(ids, vec![1, 4, 5]);
        assert_eq!(response.hits[0].members, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_pages_over_consolidated_titles() {
        let (service, _) = recording_service();

        let first = service
            .search(&SearchRequest::new("dune").with_limit(2))
            .await
            .unwrap();
        assert_eq!(first.hits.len(), 2);
        assert!(first.has_more);

        let second = service
            .search(&SearchRequest::new("dune").with_limit(2).with_offset(2))
            .await
            .unwrap();
        assert_eq!(second.hits.len(), 1);
        assert_eq!(second.hits[0].hit.id, 5);
        assert!(!second.has_more);

        let beyond = service
            .search(&SearchRequest::new("dune").with_limit(2).with_offset(3))
            .await
            .unwrap();
        assert!(beyond.hits.is_empty());
        assert!(!beyond.has_more);
    }

    #[tokio::test]
    async fn test_backend_query_uses_overfetch_window_and_filter() {
        let (service, backend) = recording_service();

        service
            .search(
                &SearchRequest::new("  dune ")
                    .with_limit(10)
                    .with_offset(20)
                    .with_providers(["kodik", "turbo"])
                    .with_categories(["movie"]),
            )
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query, "dune");
        assert_eq!(seen[0].offset, 0);
        assert_eq!(seen[0].limit, 150);
        assert_eq!(
            seen[0].filter.to_expression().as_deref(),
            Some(r#"provider IN ["kodik", "turbo"] AND category IN ["movie"]"#)
        );
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let (service, backend) = recording_service();

        service
            .search(&SearchRequest::new("dune").with_limit(0))
            .await
            .unwrap();
        service
            .search(&SearchRequest::new("dune").with_limit(100_000))
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].limit, 5);
        assert_eq!(seen[1].limit, 500);
    }

    #[tokio::test]
    async fn test_full_window_with_more_backend_rows_has_more() {
        let config = SearchConfig {
            overfetch_multiplier: 1,
            ..SearchConfig::default()
        };
        let service = SearchService::new(Arc::new(StaticBackend::new(catalog())), config);

        // Window of 2 raw rows out of 6: rows 1 and 2 share no ID yet
        let response = service
            .search(&SearchRequest::new("dune").with_limit(2))
            .await
            .unwrap();
        assert_eq!(response.hits.len(), 2);
        assert!(response.has_more);

        let beyond = service
            .search(&SearchRequest::new("dune").with_limit(2).with_offset(10))
            .await
            .unwrap();
        assert!(beyond.hits.is_empty());
        assert!(!beyond.has_more);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let service = SearchService::new(Arc::new(FailingBackend), SearchConfig::default());

        let err = service.search(&SearchRequest::new("dune")).await.unwrap_err();

        assert!(err.is_backend_failure());
        assert!(matches!(err, CatalogSearchError::BackendError { status: 503, .. }));
    }
}
