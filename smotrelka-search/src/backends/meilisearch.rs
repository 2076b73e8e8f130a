//! Meilisearch backend for production use.

use async_trait::async_trait;
use serde::Serialize;
use smotrelka_core::BackendConfig;
use tracing::{debug, warn};

use super::{BackendQuery, BackendResponse, SearchBackend};
use crate::errors::CatalogSearchError;

/// Meilisearch backend querying the titles index over HTTP.
///
/// Authenticates with a search-only key when one is configured. The request
/// timeout comes from the backend configuration; no retries are attempted.
#[derive(Debug, Clone)]
pub struct MeilisearchBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

/// Body of a Meilisearch search request.
#[derive(Debug, Serialize)]
struct MeiliSearchRequest<'a> {
    q: &'a str,
    limit: usize,
    offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

impl MeilisearchBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    /// - `CatalogSearchError::InvalidConfiguration` - HTTP client could not be built
    pub fn from_config(config: &BackendConfig) -> Result<Self, CatalogSearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| CatalogSearchError::InvalidConfiguration {
                reason: format!("HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: search_endpoint(&config.url, &config.index),
            api_key: config.api_key.clone(),
        })
    }

    /// Search endpoint this backend posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn search_endpoint(base_url: &str, index: &str) -> String {
    format!("{}/indexes/{}/search", base_url.trim_end_matches('/'), index)
}

#[async_trait]
impl SearchBackend for MeilisearchBackend {
    async fn search(&self, query: &BackendQuery) -> Result<BackendResponse, CatalogSearchError> {
        let body = MeiliSearchRequest {
            q: &query.query,
            limit: query.limit,
            offset: query.offset,
            filter: query.filter.to_expression(),
        };
        debug!(endpoint = %self.endpoint, query = %query.query, limit = query.limit, filter = ?body.filter, "Querying Meilisearch");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref api_key) = self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("Meilisearch request timed out: {e}")
            } else {
                format!("Meilisearch request failed: {e}")
            };
            CatalogSearchError::BackendUnavailable { reason }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Meilisearch error");
            return Err(CatalogSearchError::BackendError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: BackendResponse =
            response
                .json()
                .await
                .map_err(|e| CatalogSearchError::MalformedResponse {
                    reason: format!("Meilisearch JSON parsing failed: {e}"),
                })?;

        debug!(
            hits = parsed.hits.len(),
            processing_time_ms = parsed.processing_time_ms,
            estimated_total_hits = ?parsed.estimated_total_hits,
            "Meilisearch answered"
        );

        Ok(parsed)
    }
}
