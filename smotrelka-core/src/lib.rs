//! Smotrelka Core - Shared configuration and logging
//!
//! Holds the pieces every other crate in the workspace leans on: the central
//! configuration, the tracing setup used by the binaries, and the top-level
//! error type.

pub mod config;
pub mod tracing_setup;

pub use config::{BackendConfig, SearchConfig, ServerConfig, SmotrelkaConfig};

/// Core errors that can bubble up from configuration and startup.
#[derive(Debug, thiserror::Error)]
pub enum SmotrelkaError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {reason}")]
    Logging { reason: String },
}

impl SmotrelkaError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            SmotrelkaError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            SmotrelkaError::Io(_) => "File system error occurred".to_string(),
            SmotrelkaError::Logging { .. } => "Could not set up logging".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SmotrelkaError>;
