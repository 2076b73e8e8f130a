//! Smotrelka Web - JSON API Server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Exposes consolidated title search and the provider catalog over HTTP for
//! frontend applications and external clients.

pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, WebError, router, run_server};
