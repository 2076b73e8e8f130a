//! Per-title index of which provider can play which identifier.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use super::identifiers::Identifiers;
use crate::registry::{ProviderKey, SourceRegistry};
use crate::types::{IdentifierEntry, RawHit};

/// Label used when a hit has no usable title at all.
pub const FALLBACK_LABEL: &str = "-";

/// Identifier lists for one provider, one list per registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryLists {
    lists: [Vec<IdentifierEntry>; SourceRegistry::COUNT],
}

impl RegistryLists {
    /// Entries recorded for `registry`, in first-seen order.
    pub fn get(&self, registry: SourceRegistry) -> &[IdentifierEntry] {
        &self.lists[registry.slot()]
    }

    fn push_unique(&mut self, registry: SourceRegistry, id: &str, label: &str) -> bool {
        let list = &mut self.lists[registry.slot()];
        if list.iter().any(|entry| entry.id == id) {
            return false;
        }
        list.push(IdentifierEntry {
            id: id.to_string(),
            label: label.to_string(),
        });
        true
    }
}

impl Serialize for RegistryLists {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SourceRegistry::COUNT))?;
        for registry in SourceRegistry::ALL {
            map.serialize_entry(registry.as_str(), self.get(registry))?;
        }
        map.end()
    }
}

/// Provider → registry → identifiers for one consolidated title.
///
/// Every provider and registry is always present, so lookups never need to
/// check for missing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderIndex {
    providers: [RegistryLists; ProviderKey::COUNT],
}

/// Identifier chosen for opening a title with a specific provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<'a> {
    /// Registry the identifier belongs to
    pub registry: SourceRegistry,
    /// Parameter name the provider expects for that registry
    pub param: &'static str,
    /// Identifier entry to pass
    pub entry: &'a IdentifierEntry,
}

impl ProviderIndex {
    /// Lists recorded for `provider`.
    pub fn provider(&self, provider: ProviderKey) -> &RegistryLists {
        &self.providers[provider.slot()]
    }

    /// Entries recorded for `provider` in `registry`.
    pub fn get(&self, provider: ProviderKey, registry: SourceRegistry) -> &[IdentifierEntry] {
        self.provider(provider).get(registry)
    }

    /// Every non-empty list with its provider and registry.
    pub fn iter(&self) -> impl Iterator<Item = (ProviderKey, SourceRegistry, &[IdentifierEntry])> {
        ProviderKey::ALL.into_iter().flat_map(move |provider| {
            SourceRegistry::ALL.into_iter().filter_map(move |registry| {
                let entries = self.get(provider, registry);
                (!entries.is_empty()).then_some((provider, registry, entries))
            })
        })
    }

    /// Providers that can play this title, most preferred first.
    pub fn available_providers(&self) -> Vec<ProviderKey> {
        let mut providers: Vec<ProviderKey> = ProviderKey::ALL
            .into_iter()
            .filter(|&provider| self.lookup(provider, None).is_some())
            .collect();
        providers.sort_by_key(|provider| provider.priority());
        providers
    }

    /// Total number of entries across all lists.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, _, entries)| entries.len()).sum()
    }

    /// True when no hit contributed an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Picks the identifier to open this title with `provider`.
    ///
    /// A `forced` registry wins when the provider accepts it and an entry
    /// exists; otherwise the provider's accepted registries are tried in its
    /// own preference order.
    pub fn lookup(&self, provider: ProviderKey, forced: Option<SourceRegistry>) -> Option<Lookup<'_>> {
        let lists = self.provider(provider);
        let candidate = |registry: SourceRegistry| {
            let param = provider.lookup_param(registry)?;
            let entry = lists.get(registry).first()?;
            Some(Lookup {
                registry,
                param,
                entry,
            })
        };

        forced.and_then(candidate).or_else(|| {
            provider
                .lookup_params()
                .iter()
                .find_map(|&(registry, _)| candidate(registry))
        })
    }
}

impl Serialize for ProviderIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ProviderKey::COUNT))?;
        for provider in ProviderKey::ALL {
            map.serialize_entry(provider.as_str(), self.provider(provider))?;
        }
        map.end()
    }
}

/// Accumulates the provider index of one equivalence class.
///
/// Hits must be added in input order: the first label seen for an
/// identifier is the one kept.
#[derive(Debug, Default)]
pub struct ProviderIndexBuilder {
    index: ProviderIndex,
    unrecognized: usize,
}

impl ProviderIndexBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the identifiers of one class member.
    pub fn add_hit(&mut self, hit: &RawHit, identifiers: &Identifiers) {
        let raw_provider = hit.provider.as_deref().unwrap_or_default();
        let Some(provider) = ProviderKey::normalize(raw_provider) else {
            self.unrecognized += 1;
            debug!(
                hit_id = hit.id,
                provider = raw_provider,
                "Unrecognized provider, hit contributes no identifiers"
            );
            return;
        };

        let label = display_label(hit);
        let lists = &mut self.index.providers[provider.slot()];
        for (registry, id) in identifiers.iter() {
            lists.push_unique(registry, id, &label);
        }
    }

    /// Number of hits whose provider was empty or not recognized.
    pub fn unrecognized(&self) -> usize {
        self.unrecognized
    }

    /// Returns the finished index.
    pub fn finish(self) -> ProviderIndex {
        self.index
    }
}

/// Display label of a hit: its best title, with the year in parentheses.
pub fn display_label(hit: &RawHit) -> String {
    let title = [
        hit.provider_title.as_deref(),
        hit.title_ru.as_deref(),
        hit.title_en.as_deref(),
        hit.original_title.as_deref(),
        hit.alt_titles.first().map(String::as_str),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|title| !title.is_empty())
    .unwrap_or(FALLBACK_LABEL);

    match hit.year {
        Some(year) if year > 0 => format!("{title} ({year})"),
        _ => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::consolidation::identifiers::extract_identifiers;

    fn hit(provider: &str, title: &str) -> RawHit {
        RawHit {
            provider: Some(provider.to_string()),
            title_en: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_label_fallback_chain() {
        let mut hit = RawHit {
            original_title: Some("Original".to_string()),
            alt_titles: vec!["Alt".to_string()],
            ..Default::default()
        };
        assert_eq!(display_label(&hit), "Original");

        hit.title_en = Some("English".to_string());
        assert_eq!(display_label(&hit), "English");

        hit.title_ru = Some("  ".to_string());
        assert_eq!(display_label(&hit), "English");

        hit.title_ru = Some("Русский".to_string());
        hit.provider_title = Some("Provider cut".to_string());
        hit.year = Some(2010);
        assert_eq!(display_label(&hit), "Provider cut (2010)");

        let alt_only = RawHit {
            alt_titles: vec!["Alt".to_string()],
            ..Default::default()
        };
        assert_eq!(display_label(&alt_only), "Alt");
        assert_eq!(display_label(&RawHit::default()), "-");

        let year_only = RawHit {
            year: Some(1999),
            ..Default::default()
        };
        assert_eq!(display_label(&year_only), "- (1999)");
    }

    #[test]
    fn test_builder_dedups_by_id_first_label_wins() {
        let first = hit("kodik", "First").with_identifier(SourceRegistry::Imdb, "tt1");
        let second = hit("kodik/anime", "Second").with_identifier(SourceRegistry::Imdb, "tt1");
        let third = hit("kodik", "Third").with_identifier(SourceRegistry::Imdb, "tt2");

        let mut builder = ProviderIndexBuilder::new();
        for h in [&first, &second, &third] {
            builder.add_hit(h, &extract_identifiers(h));
        }
        let index = builder.finish();

        let entries = index.get(ProviderKey::Kodik, SourceRegistry::Imdb);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "tt1");
        assert_eq!(entries[0].label, "First");
        assert_eq!(entries[1].id, "tt2");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_builder_counts_unrecognized_providers() {
        let unknown = hit("collaps", "Unknown").with_identifier(SourceRegistry::Imdb, "tt1");
        let missing = RawHit::default().with_identifier(SourceRegistry::Imdb, "tt1");

        let mut builder = ProviderIndexBuilder::new();
        builder.add_hit(&unknown, &extract_identifiers(&unknown));
        builder.add_hit(&missing, &extract_identifiers(&missing));

        assert_eq!(builder.unrecognized(), 2);
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn test_index_serializes_every_key() {
        let value = serde_json::to_value(ProviderIndex::default()).unwrap();
        let providers = value.as_object().unwrap();

        assert_eq!(providers.len(), ProviderKey::COUNT);
        for provider in ProviderKey::ALL {
            let registries = providers[provider.as_str()].as_object().unwrap();
            assert_eq!(registries.len(), SourceRegistry::COUNT);
            for registry in SourceRegistry::ALL {
                assert_eq!(registries[registry.as_str()], json!([]));
            }
        }
    }

    #[test]
    fn test_lookup_prefers_forced_then_provider_order() {
        let h = hit("lumex", "Heat")
            .with_identifier(SourceRegistry::Imdb, "tt0113277")
            .with_identifier(SourceRegistry::Kinopoisk, 409)
            .with_identifier(SourceRegistry::Shikimori, 12);
        let mut builder = ProviderIndexBuilder::new();
        builder.add_hit(&h, &extract_identifiers(&h));
        let index = builder.finish();

        let default = index.lookup(ProviderKey::Lumex, None).unwrap();
        assert_eq!(default.registry, SourceRegistry::Kinopoisk);
        assert_eq!(default.param, "kp_id");
        assert_eq!(default.entry.id, "409");

        let forced = index
            .lookup(ProviderKey::Lumex, Some(SourceRegistry::Imdb))
            .unwrap();
        assert_eq!(forced.param, "imdb_id");

        // Lumex does not accept shikimori, so the forced choice falls back
        let fallback = index
            .lookup(ProviderKey::Lumex, Some(SourceRegistry::Shikimori))
            .unwrap();
        assert_eq!(fallback.registry, SourceRegistry::Kinopoisk);

        assert!(index.lookup(ProviderKey::Kodik, None).is_none());
        assert_eq!(index.available_providers(), vec![ProviderKey::Lumex]);
    }
}
