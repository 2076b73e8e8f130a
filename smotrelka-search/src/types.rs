//! Data types for catalog search.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::consolidation::ProviderIndex;
use crate::registry::SourceRegistry;

/// Output key holding the provider index of a consolidated record.
pub const PROVIDER_IDS_FIELD: &str = "provider_ids";

/// One provider-contributed row returned by the search backend.
///
/// Fields the backend sends with the wrong type are read as absent rather
/// than failing the whole response, but the value as sent is kept in
/// `originals` and written back out in its place. Fields not listed here are
/// kept in `extra` and written back out unchanged, so a row serializes to
/// exactly what the backend sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHit {
    /// Backend row ID
    pub id: u64,
    /// Catalog category such as `movie` or `anime_series`
    pub category: Option<String>,
    /// Title in the original language
    pub original_title: Option<String>,
    /// Title as the provider lists it
    pub provider_title: Option<String>,
    /// English title
    pub title_en: Option<String>,
    /// Russian title
    pub title_ru: Option<String>,
    /// Alternate titles
    pub alt_titles: Vec<String>,
    /// Release year
    pub year: Option<i32>,
    /// Contributing provider, `"<key>"` or `"<key>/<variant>"`
    pub provider: Option<String>,
    /// IMDb ID as sent by the backend
    pub imdb_id: Option<Value>,
    /// Kinopoisk ID as sent by the backend
    pub kinopoisk_id: Option<Value>,
    /// TMDB ID as sent by the backend
    pub tmdb_id: Option<Value>,
    /// MyDramaList ID as sent by the backend
    pub mydramalist_id: Option<Value>,
    /// Shikimori ID as sent by the backend
    pub shikimori_id: Option<Value>,
    /// World Art ID as sent by the backend
    pub worldart_id: Option<Value>,
    /// Sent values of typed fields that did not read back identically.
    /// They take precedence over the typed field when serializing.
    pub originals: Map<String, Value>,
    /// Every other field of the row, passed through untouched
    pub extra: Map<String, Value>,
}

impl RawHit {
    /// Raw identifier value for `registry`, exactly as the backend sent it.
    ///
    /// An explicit `null` is `Some(Value::Null)`.
    pub fn identifier(&self, registry: SourceRegistry) -> Option<&Value> {
        match registry {
            SourceRegistry::Imdb => self.imdb_id.as_ref(),
            SourceRegistry::Kinopoisk => self.kinopoisk_id.as_ref(),
            SourceRegistry::Tmdb => self.tmdb_id.as_ref(),
            SourceRegistry::Mydramalist => self.mydramalist_id.as_ref(),
            SourceRegistry::Shikimori => self.shikimori_id.as_ref(),
            SourceRegistry::Worldart => self.worldart_id.as_ref(),
        }
    }

    fn identifier_mut(&mut self, registry: SourceRegistry) -> &mut Option<Value> {
        match registry {
            SourceRegistry::Imdb => &mut self.imdb_id,
            SourceRegistry::Kinopoisk => &mut self.kinopoisk_id,
            SourceRegistry::Tmdb => &mut self.tmdb_id,
            SourceRegistry::Mydramalist => &mut self.mydramalist_id,
            SourceRegistry::Shikimori => &mut self.shikimori_id,
            SourceRegistry::Worldart => &mut self.worldart_id,
        }
    }

    /// Sets the identifier for `registry`, builder style.
    pub fn with_identifier(mut self, registry: SourceRegistry, value: impl Into<Value>) -> Self {
        *self.identifier_mut(registry) = Some(value.into());
        self
    }

    /// The row as it is written back out.
    pub fn to_row(&self) -> Map<String, Value> {
        let typed: [(&str, Option<Value>); 9] = [
            ("id", Some(self.id.into())),
            ("category", self.category.clone().map(Value::from)),
            ("original_title", self.original_title.clone().map(Value::from)),
            ("provider_title", self.provider_title.clone().map(Value::from)),
            ("title_en", self.title_en.clone().map(Value::from)),
            ("title_ru", self.title_ru.clone().map(Value::from)),
            (
                "alt_titles",
                (!self.alt_titles.is_empty()).then(|| self.alt_titles.clone().into()),
            ),
            ("year", self.year.map(Value::from)),
            ("provider", self.provider.clone().map(Value::from)),
        ];

        let mut row = Map::new();
        for (key, value) in typed {
            if let Some(value) = self.originals.get(key).cloned().or(value) {
                row.insert(key.to_string(), value);
            }
        }
        for registry in SourceRegistry::ALL {
            if let Some(value) = self.identifier(registry) {
                row.insert(registry.field_name().to_string(), value.clone());
            }
        }
        for (key, value) in &self.extra {
            if key != PROVIDER_IDS_FIELD && !row.contains_key(key) {
                row.insert(key.clone(), value.clone());
            }
        }
        row
    }

    /// Reads a backend row, keeping every value needed to write it back.
    pub fn from_row(mut row: Map<String, Value>) -> Self {
        let mut hit = RawHit::default();
        let mut originals = Map::new();

        hit.id = take(&mut row, &mut originals, "id", lenient::row_id).unwrap_or_default();
        hit.category = take(&mut row, &mut originals, "category", lenient::string).flatten();
        hit.original_title = take(&mut row, &mut originals, "original_title", lenient::string).flatten();
        hit.provider_title = take(&mut row, &mut originals, "provider_title", lenient::string).flatten();
        hit.title_en = take(&mut row, &mut originals, "title_en", lenient::string).flatten();
        hit.title_ru = take(&mut row, &mut originals, "title_ru", lenient::string).flatten();
        hit.alt_titles = take(&mut row, &mut originals, "alt_titles", lenient::string_list).unwrap_or_default();
        hit.year = take(&mut row, &mut originals, "year", lenient::year).flatten();
        hit.provider = take(&mut row, &mut originals, "provider", lenient::string).flatten();

        for registry in SourceRegistry::ALL {
            *hit.identifier_mut(registry) = row.remove(registry.field_name());
        }

        if row.remove(PROVIDER_IDS_FIELD).is_some() {
            debug!(hit_id = hit.id, "Dropped backend field {PROVIDER_IDS_FIELD}, consolidation rebuilds it");
        }

        hit.originals = originals;
        hit.extra = row;
        hit
    }
}

/// Removes `key` from `row` and reads it with `parse`.
///
/// The sent value goes to `originals` unless the typed value writes back
/// identically.
fn take<T: Serialize>(
    row: &mut Map<String, Value>,
    originals: &mut Map<String, Value>,
    key: &str,
    parse: fn(&Value) -> T,
) -> Option<T> {
    let sent = row.remove(key)?;
    let typed = parse(&sent);

    let written = match serde_json::to_value(&typed) {
        Ok(Value::Null) | Err(_) => None,
        Ok(Value::Array(items)) if items.is_empty() => None,
        Ok(value) => Some(value),
    };
    if written.as_ref() != Some(&sent) {
        originals.insert(key.to_string(), sent);
    }
    Some(typed)
}

impl Serialize for RawHit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_row().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawHit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(RawHit::from_row)
    }
}

/// One identifier a provider can play, with a label for the variant it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierEntry {
    /// Canonical identifier value
    pub id: String,
    /// Display label of the hit that contributed the identifier
    pub label: String,
}

/// One consolidated title: the representative hit plus its provider index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    /// First hit of the class in input order, copied verbatim
    #[serde(flatten)]
    pub hit: RawHit,
    /// Which provider can play which identifier
    pub provider_ids: ProviderIndex,
    /// Input positions of every hit merged into this record, in input order
    #[serde(skip)]
    pub members: Vec<usize>,
}

/// Client request to the consolidation entry point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,
    /// Page size over consolidated titles
    #[serde(default)]
    pub limit: Option<usize>,
    /// Offset over consolidated titles
    #[serde(default)]
    pub offset: Option<usize>,
    /// Restrict to these `provider` values
    #[serde(default)]
    pub providers: Vec<String>,
    /// Restrict to these categories
    #[serde(default)]
    pub categories: Vec<String>,
}

impl SearchRequest {
    /// Creates a request for `query` with default paging and no filters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Restricts results to the given providers.
    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts results to the given categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

/// Page of consolidated titles returned to the caller.
///
/// `has_more` and `estimated_total_hits` are computed over the raw window
/// fetched from the backend, so they are approximate whenever the backend
/// holds more matching rows than that window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Consolidated titles on this page
    pub hits: Vec<EnrichedRecord>,
    /// Whether more consolidated titles follow this page
    pub has_more: bool,
    /// Number of consolidated titles, not raw rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total_hits: Option<usize>,
}

impl SearchResponse {
    /// Response for a query that matched nothing.
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            has_more: false,
            estimated_total_hits: Some(0),
        }
    }
}

/// Readers that treat wrong-typed values as absent.
mod lenient {
    use serde_json::Value;

    pub(super) fn string(value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    pub(super) fn string_list(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::String(s) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub(super) fn year(value: &Value) -> Option<i32> {
        match value {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(super) fn row_id(value: &Value) -> u64 {
        match value {
            Value::Number(n) => n.as_u64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        }
    }
}
