//! Error types for catalog search.

use thiserror::Error;

/// Errors that can occur while searching the catalog.
///
/// Consolidation itself never fails; every variant here comes from talking to
/// the search backend or loading hit data.
#[derive(Debug, Error)]
pub enum CatalogSearchError {
    /// The backend could not be reached or did not answer in time.
    #[error("Search backend unavailable: {reason}")]
    BackendUnavailable {
        /// The reason the request did not complete
        reason: String,
    },

    /// The backend answered with a non-success status.
    #[error("Search backend returned HTTP {status}: {body}")]
    BackendError {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// The backend answered with a body that is not a search response.
    #[error("Malformed search response: {reason}")]
    MalformedResponse {
        /// The reason the body could not be parsed
        reason: String,
    },

    /// The backend client could not be built from its configuration.
    #[error("Invalid backend configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the configuration
        reason: String,
    },

    /// A hit fixture file could not be read or parsed.
    #[error("Fixture error: {reason}")]
    Fixture {
        /// The reason the fixture could not be loaded
        reason: String,
    },
}

impl CatalogSearchError {
    /// Returns true when the failure happened on the backend side of the call.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            CatalogSearchError::BackendUnavailable { .. }
                | CatalogSearchError::BackendError { .. }
                | CatalogSearchError::MalformedResponse { .. }
        )
    }
}
