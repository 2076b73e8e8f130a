//! Closed sets of identifier namespaces and playback providers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// External identifier namespace a hit can carry an ID for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRegistry {
    /// IMDb title IDs (`tt0133093`)
    Imdb,
    /// Kinopoisk numeric film IDs
    Kinopoisk,
    /// The Movie Database IDs
    Tmdb,
    /// MyDramaList slugs
    Mydramalist,
    /// Shikimori anime IDs
    Shikimori,
    /// World Art IDs
    Worldart,
}

impl SourceRegistry {
    /// Number of registries.
    pub const COUNT: usize = 6;

    /// Every registry in canonical order.
    pub const ALL: [SourceRegistry; Self::COUNT] = [
        SourceRegistry::Imdb,
        SourceRegistry::Kinopoisk,
        SourceRegistry::Tmdb,
        SourceRegistry::Mydramalist,
        SourceRegistry::Shikimori,
        SourceRegistry::Worldart,
    ];

    /// Short name used as the key in provider indexes.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceRegistry::Imdb => "imdb",
            SourceRegistry::Kinopoisk => "kinopoisk",
            SourceRegistry::Tmdb => "tmdb",
            SourceRegistry::Mydramalist => "mydramalist",
            SourceRegistry::Shikimori => "shikimori",
            SourceRegistry::Worldart => "worldart",
        }
    }

    /// Name of the hit field carrying this registry's ID.
    pub fn field_name(self) -> &'static str {
        match self {
            SourceRegistry::Imdb => "imdb_id",
            SourceRegistry::Kinopoisk => "kinopoisk_id",
            SourceRegistry::Tmdb => "tmdb_id",
            SourceRegistry::Mydramalist => "mydramalist_id",
            SourceRegistry::Shikimori => "shikimori_id",
            SourceRegistry::Worldart => "worldart_id",
        }
    }

    /// Page describing `id` on the registry's own site.
    ///
    /// World Art keeps anime and live-action titles in separate sections,
    /// picked by whether `category` mentions `anime`.
    pub fn source_url(self, id: &str, category: Option<&str>) -> String {
        match self {
            SourceRegistry::Imdb => format!("https://www.imdb.com/title/{id}/"),
            SourceRegistry::Kinopoisk => format!("https://www.kinopoisk.ru/film/{id}/"),
            SourceRegistry::Tmdb => format!("https://www.themoviedb.org/movie/{id}"),
            SourceRegistry::Mydramalist => format!("https://mydramalist.com/{id}"),
            SourceRegistry::Shikimori => format!("https://shikimori.one/animes/{id}"),
            SourceRegistry::Worldart => {
                let section = if category.is_some_and(|c| c.contains("anime")) {
                    "animation/animation.php"
                } else {
                    "cinema/cinema.php"
                };
                format!("http://www.world-art.ru/{section}?id={id}")
            }
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// Display name of a catalog category, `None` for categories without one.
pub fn category_label(category: &str) -> Option<&'static str> {
    let label = match category {
        "movie" => "Фильм",
        "series" => "Сериал",
        "anime_movie" => "Аниме-фильм",
        "anime_series" => "Аниме-сериал",
        "cartoon" => "Мультфильм",
        "cartoon_movie" => "Мультфильм",
        "cartoon_series" => "Мультсериал",
        "show" => "ТВ-Шоу",
        _ => return None,
    };
    Some(label)
}

impl fmt::Display for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Playback backend that can resolve some identifier types into a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKey {
    /// Turbo player
    Turbo,
    /// FlixCDN player
    Flixcdn,
    /// Lumex player
    Lumex,
    /// Kodik player
    Kodik,
}

impl ProviderKey {
    /// Number of providers.
    pub const COUNT: usize = 4;

    /// Every provider, most preferred first.
    pub const ALL: [ProviderKey; Self::COUNT] = [
        ProviderKey::Turbo,
        ProviderKey::Flixcdn,
        ProviderKey::Lumex,
        ProviderKey::Kodik,
    ];

    /// Key as it appears in the `provider` field of a hit.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKey::Turbo => "turbo",
            ProviderKey::Flixcdn => "flixcdn",
            ProviderKey::Lumex => "lumex",
            ProviderKey::Kodik => "kodik",
        }
    }

    /// Human-readable provider name.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKey::Turbo => "Turbo",
            ProviderKey::Flixcdn => "FlixCDN",
            ProviderKey::Lumex => "Lumex",
            ProviderKey::Kodik => "Kodik",
        }
    }

    /// Tie-break order between providers, lower is preferred.
    pub fn priority(self) -> u8 {
        match self {
            ProviderKey::Turbo => 1,
            ProviderKey::Flixcdn => 2,
            ProviderKey::Lumex => 3,
            ProviderKey::Kodik => 4,
        }
    }

    /// Registries the provider accepts as lookup keys, in preference order,
    /// with the parameter name the provider expects for each.
    pub fn lookup_params(self) -> &'static [(SourceRegistry, &'static str)] {
        match self {
            ProviderKey::Turbo => &[
                (SourceRegistry::Kinopoisk, "kinopoisk_id"),
                (SourceRegistry::Imdb, "imdb_id"),
                (SourceRegistry::Worldart, "worldart_id"),
            ],
            ProviderKey::Flixcdn => &[
                (SourceRegistry::Kinopoisk, "kinopoisk"),
                (SourceRegistry::Imdb, "imdb"),
            ],
            ProviderKey::Lumex => &[
                (SourceRegistry::Kinopoisk, "kp_id"),
                (SourceRegistry::Imdb, "imdb_id"),
            ],
            ProviderKey::Kodik => &[
                (SourceRegistry::Kinopoisk, "kinopoiskID"),
                (SourceRegistry::Imdb, "imdbID"),
                (SourceRegistry::Worldart, "worldartAnimationID"),
                (SourceRegistry::Shikimori, "shikimoriID"),
                (SourceRegistry::Mydramalist, "mydramalistID"),
            ],
        }
    }

    /// Parameter name for `registry`, if the provider accepts it at all.
    pub fn lookup_param(self, registry: SourceRegistry) -> Option<&'static str> {
        self.lookup_params()
            .iter()
            .find(|(accepted, _)| *accepted == registry)
            .map(|(_, param)| *param)
    }

    /// Resolves a raw `provider` field (`"kodik"` or `"kodik/anime"`) to its key.
    ///
    /// Only the part before the first `/` is considered.
    pub fn normalize(provider: &str) -> Option<ProviderKey> {
        let base = provider.split('/').next().unwrap_or_default();
        base.parse().ok()
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl FromStr for ProviderKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turbo" => Ok(ProviderKey::Turbo),
            "flixcdn" => Ok(ProviderKey::Flixcdn),
            "lumex" => Ok(ProviderKey::Lumex),
            "kodik" => Ok(ProviderKey::Kodik),
            _ => Err(format!("Unknown provider: {s}")),
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public description of a provider, served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    /// Provider key
    pub key: ProviderKey,
    /// Display name
    pub label: &'static str,
    /// Tie-break priority, lower is preferred
    pub priority: u8,
    /// Accepted registries with their lookup parameter names
    pub lookup_params: Vec<LookupParam>,
}

/// One accepted lookup registry of a provider.
#[derive(Debug, Clone, Serialize)]
pub struct LookupParam {
    /// Registry accepted as a lookup key
    pub registry: SourceRegistry,
    /// Parameter name the provider expects
    pub param: &'static str,
}

impl From<ProviderKey> for ProviderInfo {
    fn from(key: ProviderKey) -> Self {
        Self {
            key,
            label: key.label(),
            priority: key.priority(),
            lookup_params: key
                .lookup_params()
                .iter()
                .map(|&(registry, param)| LookupParam { registry, param })
                .collect(),
        }
    }
}

/// Catalog of every provider ordered by priority.
pub fn provider_catalog() -> Vec<ProviderInfo> {
    let mut catalog: Vec<ProviderInfo> = ProviderKey::ALL.into_iter().map(Into::into).collect();
    catalog.sort_by_key(|info| info.priority);
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url() {
        assert_eq!(
            SourceRegistry::Imdb.source_url("tt0133093", None),
            "https://www.imdb.com/title/tt0133093/"
        );
        assert_eq!(
            SourceRegistry::Kinopoisk.source_url("301", Some("movie")),
            "https://www.kinopoisk.ru/film/301/"
        );
        assert_eq!(
            SourceRegistry::Worldart.source_url("1124", Some("anime_movie")),
            "http://www.world-art.ru/animation/animation.php?id=1124"
        );
        assert_eq!(
            SourceRegistry::Worldart.source_url("55", Some("movie")),
            "http://www.world-art.ru/cinema/cinema.php?id=55"
        );
        assert_eq!(
            SourceRegistry::Worldart.source_url("55", None),
            "http://www.world-art.ru/cinema/cinema.php?id=55"
        );
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("anime_series"), Some("Аниме-сериал"));
        assert_eq!(category_label("show"), Some("ТВ-Шоу"));
        assert_eq!(category_label("documentary"), None);
    }

    #[test]
    fn test_normalize_provider() {
        assert_eq!(ProviderKey::normalize("kodik"), Some(ProviderKey::Kodik));
        assert_eq!(ProviderKey::normalize("kodik/anime"), Some(ProviderKey::Kodik));
        assert_eq!(ProviderKey::normalize("turbo/"), Some(ProviderKey::Turbo));
        assert_eq!(ProviderKey::normalize(""), None);
        assert_eq!(ProviderKey::normalize("/kodik"), None);
        assert_eq!(ProviderKey::normalize("Kodik"), None);
        assert_eq!(ProviderKey::normalize("collaps"), None);
    }

    #[test]
    fn test_slots_cover_all_variants() {
        for (i, registry) in SourceRegistry::ALL.iter().enumerate() {
            assert_eq!(registry.slot(), i);
        }
        for (i, provider) in ProviderKey::ALL.iter().enumerate() {
            assert_eq!(provider.slot(), i);
        }
    }

    #[test]
    fn test_lookup_params() {
        assert_eq!(
            ProviderKey::Lumex.lookup_param(SourceRegistry::Kinopoisk),
            Some("kp_id")
        );
        assert_eq!(ProviderKey::Lumex.lookup_param(SourceRegistry::Shikimori), None);
        assert_eq!(
            ProviderKey::Kodik.lookup_param(SourceRegistry::Mydramalist),
            Some("mydramalistID")
        );
    }

    #[test]
    fn test_provider_catalog_sorted_by_priority() {
        let catalog = provider_catalog();
        let priorities: Vec<u8> = catalog.iter().map(|p| p.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
        assert_eq!(catalog[0].key, ProviderKey::Turbo);
        assert_eq!(catalog[3].lookup_params.len(), 5);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&SourceRegistry::Mydramalist).unwrap(),
            "\"mydramalist\""
        );
        assert_eq!(serde_json::to_string(&ProviderKey::Flixcdn).unwrap(), "\"flixcdn\"");
    }
}
