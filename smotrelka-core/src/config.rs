//! Centralized configuration for Smotrelka.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::SocketAddr;
use std::time::Duration;

use crate::{Result, SmotrelkaError};

/// Central configuration for all Smotrelka components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct SmotrelkaConfig {
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
}

/// Full-text search backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the Meilisearch instance
    pub url: String,
    /// Search-only API key, never an admin key
    pub api_key: Option<String>,
    /// Index holding one row per provider-contributed title variant
    pub index: String,
    /// Timeout for a single backend request
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:7700".to_string(),
            api_key: None,
            index: "titles".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "smotrelka/0.1.0",
        }
    }
}

/// Paging and over-fetch settings for the consolidation entry point.
///
/// The backend pages over raw rows while clients page over consolidated
/// titles, so each request fetches a wider raw window than it returns.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Page size used when the client does not ask for one
    pub default_limit: usize,
    /// Largest page size a client may request
    pub max_limit: usize,
    /// Raw rows fetched per requested consolidated row
    pub overfetch_multiplier: usize,
    /// Hard cap on the raw window sent to the backend
    pub max_raw_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 30,
            max_limit: 100,
            overfetch_multiplier: 5,
            max_raw_window: 1000,
        }
    }
}

impl SearchConfig {
    /// Number of raw hits to request from the backend for a page of `limit`.
    pub fn raw_fetch_window(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.overfetch_multiplier.max(1))
            .min(self.max_raw_window)
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API server binds to
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl SmotrelkaConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Backend overrides
        if let Ok(url) = std::env::var("SMOTRELKA_MEILI_URL") {
            config.backend.url = url;
        }

        if let Ok(key) = std::env::var("SMOTRELKA_MEILI_KEY") {
            config.backend.api_key = (!key.is_empty()).then_some(key);
        }

        if let Ok(index) = std::env::var("SMOTRELKA_MEILI_INDEX") {
            config.backend.index = index;
        }

        if let Ok(timeout) = std::env::var("SMOTRELKA_BACKEND_TIMEOUT")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.backend.timeout = Duration::from_secs(seconds);
        }

        // Search overrides
        if let Ok(limit) = std::env::var("SMOTRELKA_DEFAULT_LIMIT")
            && let Ok(value) = limit.parse::<usize>()
        {
            config.search.default_limit = value;
        }

        if let Ok(multiplier) = std::env::var("SMOTRELKA_OVERFETCH")
            && let Ok(value) = multiplier.parse::<usize>()
        {
            config.search.overfetch_multiplier = value;
        }

        if let Ok(window) = std::env::var("SMOTRELKA_MAX_RAW_WINDOW")
            && let Ok(value) = window.parse::<usize>()
        {
            config.search.max_raw_window = value;
        }

        // Server overrides
        if let Ok(bind) = std::env::var("SMOTRELKA_BIND")
            && let Ok(address) = bind.parse::<SocketAddr>()
        {
            config.server.bind_address = address;
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            backend: BackendConfig {
                timeout: Duration::from_secs(2),
                ..Default::default()
            },
            server: ServerConfig {
                bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            },
            ..Default::default()
        }
    }

    /// Checks that the configuration is usable before any service starts.
    ///
    /// # Errors
    ///
    /// - `SmotrelkaError::Configuration` - Backend URL is not an absolute http(s) URL,
    ///   the index name is empty, or a paging limit is zero
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.url).map_err(|e| SmotrelkaError::Configuration {
            reason: format!("backend url '{}': {e}", self.backend.url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SmotrelkaError::Configuration {
                reason: format!("backend url must be http or https, got '{}'", url.scheme()),
            });
        }

        if self.backend.index.trim().is_empty() {
            return Err(SmotrelkaError::Configuration {
                reason: "backend index name is empty".to_string(),
            });
        }

        if self.search.default_limit == 0
            || self.search.max_limit == 0
            || self.search.max_raw_window == 0
        {
            return Err(SmotrelkaError::Configuration {
                reason: "search limits must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SmotrelkaConfig::default();

        assert_eq!(config.backend.index, "titles");
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert!(config.backend.api_key.is_none());
        assert_eq!(config.search.default_limit, 30);
        assert_eq!(config.search.overfetch_multiplier, 5);
        assert_eq!(config.search.max_raw_window, 1000);
        assert_eq!(config.server.bind_address.port(), 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_raw_fetch_window() {
        let search = SearchConfig::default();

        assert_eq!(search.raw_fetch_window(30), 150);
        assert_eq!(search.raw_fetch_window(1), 5);
        assert_eq!(search.raw_fetch_window(500), 1000);

        let no_overfetch = SearchConfig {
            overfetch_multiplier: 0,
            ..Default::default()
        };
        assert_eq!(no_overfetch.raw_fetch_window(30), 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SmotrelkaConfig::for_testing();
        config.backend.url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(SmotrelkaError::Configuration { .. })
        ));

        let mut config = SmotrelkaConfig::for_testing();
        config.backend.url = "ftp://search.example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = SmotrelkaConfig::for_testing();
        config.search.max_raw_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("SMOTRELKA_MEILI_URL", "https://search.example.org");
            std::env::set_var("SMOTRELKA_MEILI_KEY", "public_search_key");
            std::env::set_var("SMOTRELKA_BACKEND_TIMEOUT", "3");
            std::env::set_var("SMOTRELKA_OVERFETCH", "8");
            std::env::set_var("SMOTRELKA_BIND", "0.0.0.0:8080");
        }

        let config = SmotrelkaConfig::from_env();

        assert_eq!(config.backend.url, "https://search.example.org");
        assert_eq!(config.backend.api_key.as_deref(), Some("public_search_key"));
        assert_eq!(config.backend.timeout, Duration::from_secs(3));
        assert_eq!(config.search.overfetch_multiplier, 8);
        assert_eq!(config.server.bind_address.port(), 8080);

        // Cleanup
        unsafe {
            std::env::remove_var("SMOTRELKA_MEILI_URL");
            std::env::remove_var("SMOTRELKA_MEILI_KEY");
            std::env::remove_var("SMOTRELKA_BACKEND_TIMEOUT");
            std::env::remove_var("SMOTRELKA_OVERFETCH");
            std::env::remove_var("SMOTRELKA_BIND");
        }
    }
}
