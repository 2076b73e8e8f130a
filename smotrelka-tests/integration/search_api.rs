//! End-to-end tests of the HTTP API over a static catalog.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use smotrelka_core::{BackendConfig, SearchConfig};
use smotrelka_search::{MeilisearchBackend, SearchService, StaticBackend};
use smotrelka_tests::sample_catalog;
use smotrelka_web::{AppState, router};
use tower::ServiceExt;

/// Meilisearch backend pointed at a port nobody listens on.
async fn unreachable_backend() -> MeilisearchBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    MeilisearchBackend::from_config(&BackendConfig {
        url: format!("http://{address}"),
        timeout: Duration::from_secs(1),
        ..Default::default()
    })
    .unwrap()
}

fn catalog_router() -> Router {
    let service = SearchService::new(
        Arc::new(StaticBackend::new(sample_catalog())),
        SearchConfig::default(),
    );
    router(AppState::new(service))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn hit_ids(body: &Value) -> Vec<u64> {
    body["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_search_returns_consolidated_titles() {
    let (status, body) = get_json(catalog_router(), "/api/search?q=matrix").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(hit_ids(&body), vec![1, 4, 5, 6]);
    assert_eq!(body["hasMore"], json!(false));
    assert_eq!(body["estimatedTotalHits"], json!(4));

    let matrix = &body["hits"][0];
    assert_eq!(matrix["title_ru"], json!("Матрица"));
    assert_eq!(
        matrix["provider_ids"]["turbo"]["kinopoisk"],
        json!([{"id": "301", "label": "The Matrix (1999)"}])
    );
    assert_eq!(
        matrix["provider_ids"]["lumex"]["imdb"],
        json!([{"id": "tt0133093", "label": "Matrix, The (1999)"}])
    );
    assert_eq!(matrix["provider_ids"]["flixcdn"]["imdb"], json!([]));

    // unrecognized provider keeps its row but contributes nothing
    let collaps = &body["hits"][3];
    assert_eq!(collaps["provider"], json!("collaps"));
    assert_eq!(collaps["provider_ids"]["kodik"]["imdb"], json!([]));
}

#[tokio::test]
async fn test_search_pages_over_titles() {
    let (_, first) = get_json(catalog_router(), "/api/search?q=matrix&limit=3").await;
    assert_eq!(hit_ids(&first), vec![1, 4, 5]);
    assert_eq!(first["hasMore"], json!(true));

    let (_, second) = get_json(catalog_router(), "/api/search?q=matrix&limit=3&offset=3").await;
    assert_eq!(hit_ids(&second), vec![6]);
    assert_eq!(second["hasMore"], json!(false));

    let (status, beyond) = get_json(catalog_router(), "/api/search?q=matrix&offset=40").await;
    assert_eq!(status, StatusCode::OK);
    assert!(hit_ids(&beyond).is_empty());
    assert_eq!(beyond["hasMore"], json!(false));
}

#[tokio::test]
async fn test_search_filters_by_provider_and_category() {
    let (_, body) = get_json(catalog_router(), "/api/search?q=matrix&providers=kodik,turbo").await;
    // kodik row and turbo row share no identifier, only lumex linked them
    assert_eq!(hit_ids(&body), vec![1, 2]);

    let (_, body) = get_json(catalog_router(), "/api/search?q=matrix&categories=anime_movie").await;
    assert_eq!(hit_ids(&body), vec![5]);
    assert_eq!(
        body["hits"][0]["provider_ids"]["kodik"]["shikimori"],
        json!([{"id": "1124", "label": "The Animatrix (2003)"}])
    );

    let (_, body) = get_json(catalog_router(), "/api/search?q=matrix&providers=kodik/anime").await;
    assert_eq!(hit_ids(&body), vec![5]);
}

#[tokio::test]
async fn test_blank_and_unmatched_queries() {
    let (status, body) = get_json(catalog_router(), "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hits": [], "hasMore": false, "estimatedTotalHits": 0}));

    let (status, body) = get_json(catalog_router(), "/api/search?q=solaris").await;
    assert_eq!(status, StatusCode::OK);
    assert!(hit_ids(&body).is_empty());
    assert_eq!(body["estimatedTotalHits"], json!(0));
}

#[tokio::test]
async fn test_backend_failure_is_bad_gateway() {
    let service = SearchService::new(Arc::new(unreachable_backend().await), SearchConfig::default());
    let app = router(AppState::new(service));

    let (status, body) = get_json(app, "/api/search?q=matrix").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("Meilisearch"));
}

#[tokio::test]
async fn test_providers_listing() {
    let (status, body) = get_json(catalog_router(), "/api/providers").await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["turbo", "flixcdn", "lumex", "kodik"]);
}
