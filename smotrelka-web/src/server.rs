//! JSON API server for Smotrelka
//!
//! Wires the search service into an axum router and serves it.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use smotrelka_core::ServerConfig;
use smotrelka_search::SearchService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{api_health, api_providers, api_search};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Consolidating search service
    pub search_service: SearchService,
    /// When the server was started
    pub started_at: Instant,
}

impl AppState {
    /// Creates state around a search service.
    pub fn new(search_service: SearchService) -> Self {
        Self {
            search_service,
            started_at: Instant::now(),
        }
    }
}

/// Errors raised while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The listener could not be bound.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address that could not be bound
        address: SocketAddr,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(api_health))
        .route("/api/search", get(api_search))
        .route("/api/providers", get(api_providers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API until the process is stopped.
///
/// # Errors
///
/// - `WebError::Bind` - The configured address could not be bound
/// - `WebError::Serve` - The server failed while running
pub async fn run_server(config: &ServerConfig, search_service: SearchService) -> Result<(), WebError> {
    let app = router(AppState::new(search_service));

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .map_err(|source| WebError::Bind {
            address: config.bind_address,
            source,
        })?;

    let address = listener.local_addr()?;
    info!("Smotrelka API listening on http://{address}");

    axum::serve(listener, app).await?;
    Ok(())
}
