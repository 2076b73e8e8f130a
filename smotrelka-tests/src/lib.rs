//! Shared fixtures for the Smotrelka integration tests.

use serde_json::json;
use smotrelka_search::{RawHit, SourceRegistry};

/// Builds a hit with a title, provider and identifiers.
pub fn hit(id: u64, provider: &str, title: &str, ids: &[(SourceRegistry, &str)]) -> RawHit {
    ids.iter().fold(
        RawHit {
            id,
            provider: (!provider.is_empty()).then(|| provider.to_string()),
            title_en: Some(title.to_string()),
            ..Default::default()
        },
        |hit, &(registry, value)| hit.with_identifier(registry, value),
    )
}

/// Small catalog with cross-provider duplicates, as the backend would return it.
pub fn sample_catalog() -> Vec<RawHit> {
    serde_json::from_value(json!([
        {"id": 1, "title_ru": "Матрица", "title_en": "The Matrix", "year": 1999, "category": "movie", "provider": "kodik", "imdb_id": "tt0133093"},
        {"id": 2, "title_en": "The Matrix", "year": 1999, "category": "movie", "provider": "turbo", "kinopoisk_id": 301},
        {"id": 3, "provider_title": "Matrix, The", "year": 1999, "category": "movie", "provider": "lumex", "imdb_id": "tt0133093", "kinopoisk_id": "301"},
        {"id": 4, "title_en": "The Matrix Reloaded", "year": 2003, "category": "movie", "provider": "flixcdn", "imdb_id": "tt0234215"},
        {"id": 5, "title_en": "The Animatrix", "year": 2003, "category": "anime_movie", "provider": "kodik/anime", "shikimori_id": 1124, "worldart_id": 0},
        {"id": 6, "title_en": "The Matrix", "year": 1999, "category": "movie", "provider": "collaps"}
    ]))
    .expect("sample catalog is valid")
}
