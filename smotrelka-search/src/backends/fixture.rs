//! In-memory backend serving a fixed hit list.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{BackendQuery, BackendResponse, SearchBackend};
use crate::errors::CatalogSearchError;
use crate::types::RawHit;

/// Backend answering from a fixed list of rows, for development and tests.
///
/// Matching is a case-insensitive check that every query word occurs in one
/// of the row's title fields. Rows keep their list order, which stands in for
/// relevance.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    hits: Arc<Vec<RawHit>>,
}

/// Fixture files hold either a bare array of rows or a saved search response.
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Rows(Vec<RawHit>),
    Response { hits: Vec<RawHit> },
}

impl StaticBackend {
    /// Creates a backend serving `hits`.
    pub fn new(hits: Vec<RawHit>) -> Self {
        Self {
            hits: Arc::new(hits),
        }
    }

    /// Parses a fixture from JSON text.
    ///
    /// # Errors
    /// - `CatalogSearchError::Fixture` - Text is neither a row array nor a response object
    pub fn from_json_str(json: &str) -> Result<Self, CatalogSearchError> {
        let fixture: FixtureFile =
            serde_json::from_str(json).map_err(|e| CatalogSearchError::Fixture {
                reason: format!("invalid fixture JSON: {e}"),
            })?;
        let hits = match fixture {
            FixtureFile::Rows(hits) | FixtureFile::Response { hits } => hits,
        };
        Ok(Self::new(hits))
    }

    /// Loads a fixture file.
    ///
    /// # Errors
    /// - `CatalogSearchError::Fixture` - File cannot be read or parsed
    pub async fn from_file(path: &Path) -> Result<Self, CatalogSearchError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogSearchError::Fixture {
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
        Self::from_json_str(&json)
    }

    /// Number of rows served.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when the fixture holds no rows.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

fn matches_query(hit: &RawHit, words: &[String]) -> bool {
    let haystack = [
        hit.original_title.as_deref(),
        hit.provider_title.as_deref(),
        hit.title_en.as_deref(),
        hit.title_ru.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(hit.alt_titles.iter().map(String::as_str))
    .map(str::to_lowercase)
    .collect::<Vec<_>>()
    .join("\n");

    words.iter().all(|word| haystack.contains(word.as_str()))
}

#[async_trait]
impl SearchBackend for StaticBackend {
    async fn search(&self, query: &BackendQuery) -> Result<BackendResponse, CatalogSearchError> {
        let words: Vec<String> = query
            .query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let matched: Vec<&RawHit> = self
            .hits
            .iter()
            .filter(|hit| query.filter.matches(hit) && matches_query(hit, &words))
            .collect();

        Ok(BackendResponse {
            estimated_total_hits: Some(matched.len()),
            hits: matched
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect(),
            query: query.query.clone(),
            processing_time_ms: 0,
            limit: Some(query.limit),
            offset: Some(query.offset),
        })
    }
}
