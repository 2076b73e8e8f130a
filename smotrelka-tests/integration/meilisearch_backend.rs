//! Meilisearch client against a local stub server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use smotrelka_core::{BackendConfig, SearchConfig};
use smotrelka_search::{
    BackendQuery, CatalogSearchError, MeilisearchBackend, SearchBackend, SearchFilter, SearchRequest,
    SearchService,
};
use smotrelka_tests::sample_catalog;

/// What the stub answers with.
#[derive(Debug, Clone)]
enum Reply {
    Hits(Value),
    Status(StatusCode, &'static str),
    Garbage,
}

/// Requests the stub received: index, authorization header and body.
type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

#[derive(Clone)]
struct Stub {
    reply: Reply,
    seen: Seen,
}

async fn stub_search(
    State(stub): State<Stub>,
    Path(index): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    stub.seen.lock().unwrap().push((index, auth, body));

    match stub.reply {
        Reply::Hits(hits) => axum::Json(json!({
            "hits": hits,
            "query": "matrix",
            "processingTimeMs": 1,
            "limit": 20,
            "offset": 0,
            "estimatedTotalHits": 6
        }))
        .into_response(),
        Reply::Status(status, message) => (status, message).into_response(),
        Reply::Garbage => (StatusCode::OK, "{\"hits\": [").into_response(),
    }
}

async fn spawn_stub(reply: Reply) -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/indexes/{index}/search", post(stub_search))
        .with_state(Stub {
            reply,
            seen: seen.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (address, seen)
}

fn backend_config(address: SocketAddr, api_key: Option<&str>) -> BackendConfig {
    BackendConfig {
        url: format!("http://{address}/"),
        api_key: api_key.map(str::to_string),
        index: "titles".to_string(),
        timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

fn query(text: &str, filter: SearchFilter) -> BackendQuery {
    BackendQuery {
        query: text.to_string(),
        limit: 20,
        offset: 0,
        filter,
    }
}

#[tokio::test]
async fn test_search_sends_key_and_parses_hits() {
    let (address, seen) = spawn_stub(Reply::Hits(json!(sample_catalog()))).await;
    let backend = MeilisearchBackend::from_config(&backend_config(address, Some("search-key"))).unwrap();

    let response = backend
        .search(&query("matrix", SearchFilter::default()))
        .await
        .unwrap();

    assert_eq!(response.hits, sample_catalog());
    assert_eq!(response.estimated_total_hits, Some(6));
    assert_eq!(response.processing_time_ms, 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (index, auth, body) = &seen[0];
    assert_eq!(index, "titles");
    assert_eq!(auth.as_deref(), Some("Bearer search-key"));
    assert_eq!(body, &json!({"q": "matrix", "limit": 20, "offset": 0}));
}

#[tokio::test]
async fn test_search_without_key_sends_no_authorization() {
    let (address, seen) = spawn_stub(Reply::Hits(json!([]))).await;
    let backend = MeilisearchBackend::from_config(&backend_config(address, None)).unwrap();

    let filter = SearchFilter::new(&["kodik".to_string()], &[]);
    let response = backend.search(&query("matrix", filter)).await.unwrap();

    assert!(response.hits.is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].1, None);
    assert_eq!(seen[0].2["filter"], json!(r#"provider IN ["kodik"]"#));
}

#[tokio::test]
async fn test_error_status_maps_to_backend_error() {
    let (address, _) = spawn_stub(Reply::Status(StatusCode::FORBIDDEN, "invalid_api_key")).await;
    let backend = MeilisearchBackend::from_config(&backend_config(address, Some("wrong"))).unwrap();

    let err = backend
        .search(&query("matrix", SearchFilter::default()))
        .await
        .unwrap_err();

    match err {
        CatalogSearchError::BackendError { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "invalid_api_key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_truncated_body_maps_to_malformed_response() {
    let (address, _) = spawn_stub(Reply::Garbage).await;
    let backend = MeilisearchBackend::from_config(&backend_config(address, None)).unwrap();

    let err = backend
        .search(&query("matrix", SearchFilter::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogSearchError::MalformedResponse { .. }));
    assert!(err.is_backend_failure());
}

#[tokio::test]
async fn test_unreachable_backend_maps_to_unavailable() {
    // Bind and drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let backend = MeilisearchBackend::from_config(&backend_config(address, None)).unwrap();
    let err = backend
        .search(&query("matrix", SearchFilter::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogSearchError::BackendUnavailable { .. }));
}

#[tokio::test]
async fn test_service_over_meilisearch_consolidates() {
    let (address, seen) = spawn_stub(Reply::Hits(json!(sample_catalog()))).await;
    let backend = MeilisearchBackend::from_config(&backend_config(address, None)).unwrap();
    let service = SearchService::new(Arc::new(backend), SearchConfig::default());

    let response = service
        .search(
            &SearchRequest::new("matrix")
                .with_limit(2)
                .with_categories(["movie"]),
        )
        .await
        .unwrap();

    let ids: Vec<u64> = response.hits.iter().map(|r| r.hit.id).collect();
    assert_eq!(ids, vec![1, 4]);
    assert!(response.has_more);
    assert_eq!(response.estimated_total_hits, Some(4));

    let seen = seen.lock().unwrap();
    let body = &seen[0].2;
    assert_eq!(body["limit"], json!(10));
    assert_eq!(body["offset"], json!(0));
    assert_eq!(body["filter"], json!(r#"category IN ["movie"]"#));
}
