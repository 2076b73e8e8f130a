//! Full-text search backends the consolidation entry point can query.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::CatalogSearchError;
use crate::types::RawHit;

pub mod fixture;
pub mod meilisearch;

pub use fixture::StaticBackend;
pub use meilisearch::MeilisearchBackend;

/// Trait for full-text search backends.
///
/// Implementations return raw, unconsolidated rows in their own relevance
/// order (a real search engine, an in-memory fixture for development and
/// tests).
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    /// Runs one raw search.
    ///
    /// # Errors
    /// - `CatalogSearchError::BackendUnavailable` - Backend could not be reached in time
    /// - `CatalogSearchError::BackendError` - Backend answered with a non-success status
    /// - `CatalogSearchError::MalformedResponse` - Backend answer could not be parsed
    async fn search(&self, query: &BackendQuery) -> Result<BackendResponse, CatalogSearchError>;
}

/// One raw search sent to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendQuery {
    /// Trimmed, non-empty query text
    pub query: String,
    /// Number of raw rows to fetch
    pub limit: usize,
    /// Raw row offset
    pub offset: usize,
    /// Equality filters on provider and category
    pub filter: SearchFilter,
}

/// Provider and category restrictions passed down to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Allowed `provider` values; empty means any
    pub providers: Vec<String>,
    /// Allowed `category` values; empty means any
    pub categories: Vec<String>,
}

impl SearchFilter {
    /// Builds a filter, dropping blank values.
    pub fn new(providers: &[String], categories: &[String]) -> Self {
        let clean = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            providers: clean(providers),
            categories: clean(categories),
        }
    }

    /// True when the filter restricts nothing.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.categories.is_empty()
    }

    /// Filter expression in the backend's syntax, or `None` when unrestricted.
    ///
    /// ```
    /// use smotrelka_search::SearchFilter;
    ///
    /// let filter = SearchFilter::new(&["kodik".into(), "turbo".into()], &["movie".into()]);
    /// assert_eq!(
    ///     filter.to_expression().as_deref(),
    ///     Some(r#"provider IN ["kodik", "turbo"] AND category IN ["movie"]"#)
    /// );
    /// ```
    pub fn to_expression(&self) -> Option<String> {
        let clauses: Vec<String> = [("provider", &self.providers), ("category", &self.categories)]
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, values)| {
                let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("{field} IN [{}]", quoted.join(", "))
            })
            .collect();

        (!clauses.is_empty()).then(|| clauses.join(" AND "))
    }

    /// Applies the filter to a hit the way the backend would.
    pub fn matches(&self, hit: &RawHit) -> bool {
        let allowed = |values: &[String], field: Option<&str>| {
            values.is_empty() || field.is_some_and(|f| values.iter().any(|v| v == f))
        };
        allowed(&self.providers, hit.provider.as_deref())
            && allowed(&self.categories, hit.category.as_deref())
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Raw search response. Only `hits` is consumed by consolidation; the rest
/// is echoed by the backend and kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    /// Raw rows in backend relevance order
    #[serde(default)]
    pub hits: Vec<RawHit>,
    /// Query as the backend understood it
    #[serde(default)]
    pub query: String,
    /// Backend-side processing time
    #[serde(default)]
    pub processing_time_ms: u64,
    /// Raw limit the backend applied
    #[serde(default)]
    pub limit: Option<usize>,
    /// Raw offset the backend applied
    #[serde(default)]
    pub offset: Option<usize>,
    /// Backend's estimate of matching raw rows
    #[serde(default)]
    pub estimated_total_hits: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_expression() {
        assert_eq!(SearchFilter::default().to_expression(), None);

        let providers_only = SearchFilter::new(&["kodik".to_string()], &[]);
        assert_eq!(
            providers_only.to_expression().as_deref(),
            Some(r#"provider IN ["kodik"]"#)
        );

        let categories_only = SearchFilter::new(&[" ".to_string()], &["anime_series".to_string()]);
        assert_eq!(
            categories_only.to_expression().as_deref(),
            Some(r#"category IN ["anime_series"]"#)
        );
    }

    #[test]
    fn test_filter_expression_escapes_quotes() {
        let filter = SearchFilter::new(&[r#"odd"name\"#.to_string()], &[]);
        assert_eq!(
            filter.to_expression().as_deref(),
            Some(r#"provider IN ["odd\"name\\"]"#)
        );
    }

    #[test]
    fn test_filter_matches() {
        let hit = RawHit {
            provider: Some("kodik/anime".to_string()),
            category: Some("anime_series".to_string()),
            ..Default::default()
        };

        assert!(SearchFilter::default().matches(&hit));
        assert!(SearchFilter::new(&["kodik/anime".to_string()], &[]).matches(&hit));
        assert!(!SearchFilter::new(&["kodik".to_string()], &[]).matches(&hit));
        assert!(!SearchFilter::new(&[], &["movie".to_string()]).matches(&hit));
        assert!(!SearchFilter::new(&[], &["movie".to_string()]).matches(&RawHit::default()));
    }

    #[test]
    fn test_backend_response_parses_meilisearch_shape() {
        let body = r#"{
            "hits": [{"id": 1, "title_en": "Heat", "imdb_id": "tt0113277"}],
            "query": "heat",
            "processingTimeMs": 3,
            "limit": 150,
            "offset": 0,
            "estimatedTotalHits": 1
        }"#;

        let response: BackendResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.processing_time_ms, 3);
        assert_eq!(response.estimated_total_hits, Some(1));
    }
}
