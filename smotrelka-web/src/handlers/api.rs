//! API handlers for title search and provider metadata

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use smotrelka_search::registry::{ProviderInfo, provider_catalog};
use smotrelka_search::{CatalogSearchError, SearchRequest, SearchResponse};
use tracing::error;

use crate::server::AppState;

/// Query string accepted by `/api/search`.
///
/// `providers` and `categories` are comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Free-text query
    #[serde(default)]
    pub q: String,
    /// Page size over consolidated titles
    pub limit: Option<usize>,
    /// Offset over consolidated titles
    pub offset: Option<usize>,
    /// Comma-separated provider filter
    pub providers: Option<String>,
    /// Comma-separated category filter
    pub categories: Option<String>,
}

impl SearchQuery {
    /// Converts the query string into a service request.
    pub fn into_request(self) -> SearchRequest {
        SearchRequest {
            query: self.q,
            limit: self.limit,
            offset: self.offset,
            providers: split_list(self.providers.as_deref()),
            categories: split_list(self.categories.as_deref()),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Search failure rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub CatalogSearchError);

impl From<CatalogSearchError> for ApiError {
    fn from(err: CatalogSearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CatalogSearchError::BackendUnavailable { .. }
            | CatalogSearchError::BackendError { .. }
            | CatalogSearchError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            CatalogSearchError::InvalidConfiguration { .. } | CatalogSearchError::Fixture { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error!(status = status.as_u16(), error = %self.0, "Search request failed");

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// `GET /api/search` - one page of consolidated titles.
///
/// # Errors
/// Responds with 502 when the search backend fails.
pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = params.into_request();
    let response = state.search_service.search(&request).await?;
    Ok(Json(response))
}

/// `GET /api/providers` - playback providers ordered by priority.
pub async fn api_providers() -> Json<Vec<ProviderInfo>> {
    Json(provider_catalog())
}

/// `GET /healthz` - liveness probe.
pub async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}
