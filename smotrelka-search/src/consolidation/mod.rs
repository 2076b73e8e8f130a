//! Consolidation of duplicate hits into one record per title.
//!
//! Hits are grouped strictly by exact shared external identifiers. Each group
//! keeps its first hit in input order as the representative and gains a
//! provider index built from every member.

use std::collections::HashMap;

use tracing::debug;

pub mod equivalence;
pub mod identifiers;
pub mod provider_index;

pub use equivalence::{equivalence_roots, find, union};
pub use identifiers::{Identifiers, canonical_id, extract_identifiers};
pub use provider_index::{Lookup, ProviderIndex, ProviderIndexBuilder, RegistryLists, display_label};

use crate::types::{EnrichedRecord, RawHit};

/// Counters describing one consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationStats {
    /// Hits received
    pub raw_hits: usize,
    /// Records emitted, one per equivalence class
    pub classes: usize,
    /// Hits whose provider was empty or unknown
    pub unrecognized_providers: usize,
}

/// Merges duplicate hits into one enriched record per title.
///
/// Records come out in the order their representative appeared in `hits`.
pub fn consolidate(hits: Vec<RawHit>) -> Vec<EnrichedRecord> {
    consolidate_with_stats(hits).0
}

/// Same as [`consolidate`], also reporting what the pass did.
pub fn consolidate_with_stats(hits: Vec<RawHit>) -> (Vec<EnrichedRecord>, ConsolidationStats) {
    let identifiers: Vec<Identifiers> = hits.iter().map(extract_identifiers).collect();
    let roots = equivalence_roots(&identifiers);
    let classes = group_by_root(&roots);

    let mut stats = ConsolidationStats {
        raw_hits: hits.len(),
        classes: classes.len(),
        unrecognized_providers: 0,
    };

    let mut indexes = Vec::with_capacity(classes.len());
    for members in &classes {
        let mut builder = ProviderIndexBuilder::new();
        for &position in members {
            builder.add_hit(&hits[position], &identifiers[position]);
        }
        stats.unrecognized_providers += builder.unrecognized();
        indexes.push(builder.finish());
    }

    let mut slots: Vec<Option<RawHit>> = hits.into_iter().map(Some).collect();
    let records = classes
        .into_iter()
        .zip(indexes)
        .filter_map(|(members, provider_ids)| {
            let hit = slots[members[0]].take()?;
            Some(EnrichedRecord {
                hit,
                provider_ids,
                members,
            })
        })
        .collect();

    debug!(
        raw_hits = stats.raw_hits,
        classes = stats.classes,
        unrecognized_providers = stats.unrecognized_providers,
        "Consolidated search hits"
    );

    (records, stats)
}

/// Member positions per class, classes ordered by first occurrence.
fn group_by_root(roots: &[usize]) -> Vec<Vec<usize>> {
    let mut class_of_root: HashMap<usize, usize> = HashMap::new();
    let mut classes: Vec<Vec<usize>> = Vec::new();

    for (position, &root) in roots.iter().enumerate() {
        let class = *class_of_root.entry(root).or_insert_with(|| {
            classes.push(Vec::new());
            classes.len() - 1
        });
        classes[class].push(position);
    }

    classes
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::{ProviderKey, SourceRegistry};

    fn hit(id: u64, provider: &str) -> RawHit {
        RawHit {
            id,
            provider: Some(provider.to_string()),
            title_en: Some(format!("Title {id}")),
            ..Default::default()
        }
    }

    #[test]
    fn test_three_hit_example() {
        let hits = vec![
            hit(1, "kodik").with_identifier(SourceRegistry::Imdb, "tt1"),
            hit(2, "turbo").with_identifier(SourceRegistry::Kinopoisk, "500"),
            hit(3, "lumex")
                .with_identifier(SourceRegistry::Imdb, "tt1")
                .with_identifier(SourceRegistry::Kinopoisk, "500"),
        ];

        let records = consolidate(hits);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.hit.id, 1);
        assert_eq!(record.members, vec![0, 1, 2]);

        let index = &record.provider_ids;
        let ids = |p, r| {
            index
                .get(p, r)
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(ProviderKey::Kodik, SourceRegistry::Imdb), vec!["tt1"]);
        assert_eq!(ids(ProviderKey::Turbo, SourceRegistry::Kinopoisk), vec!["500"]);
        assert_eq!(ids(ProviderKey::Lumex, SourceRegistry::Imdb), vec!["tt1"]);
        assert_eq!(ids(ProviderKey::Lumex, SourceRegistry::Kinopoisk), vec!["500"]);
        assert!(ids(ProviderKey::Kodik, SourceRegistry::Kinopoisk).is_empty());
        assert!(ids(ProviderKey::Flixcdn, SourceRegistry::Imdb).is_empty());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_empty_input() {
        let (records, stats) = consolidate_with_stats(Vec::new());
        assert!(records.is_empty());
        assert_eq!(stats, ConsolidationStats::default());
    }

    #[test]
    fn test_identical_titles_without_shared_ids_stay_apart() {
        let mut a = hit(1, "kodik").with_identifier(SourceRegistry::Imdb, "tt1");
        let mut b = hit(2, "kodik").with_identifier(SourceRegistry::Imdb, "tt2");
        let mut c = hit(3, "turbo");
        for h in [&mut a, &mut b, &mut c] {
            h.title_en = Some("Solaris".to_string());
            h.year = Some(1972);
        }

        let records = consolidate(vec![a, b, c]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_output_follows_representative_order() {
        let hits = vec![
            hit(10, "turbo").with_identifier(SourceRegistry::Imdb, "tt-a"),
            hit(11, "turbo").with_identifier(SourceRegistry::Imdb, "tt-b"),
            hit(12, "kodik").with_identifier(SourceRegistry::Imdb, "tt-a"),
            hit(13, "kodik"),
            hit(14, "lumex").with_identifier(SourceRegistry::Imdb, "tt-b"),
        ];

        let records = consolidate(hits);

        let ids: Vec<u64> = records.iter().map(|r| r.hit.id).collect();
        assert_eq!(ids, vec![10, 11, 13]);
        assert_eq!(records[0].members, vec![0, 2]);
        assert_eq!(records[1].members, vec![1, 4]);
        assert_eq!(records[2].members, vec![3]);
    }

    #[test]
    fn test_unrecognized_provider_can_still_represent() {
        let hits = vec![
            hit(1, "mystery").with_identifier(SourceRegistry::Kinopoisk, 77),
            hit(2, "kodik/anime").with_identifier(SourceRegistry::Kinopoisk, "77"),
        ];

        let (records, stats) = consolidate_with_stats(hits);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hit.id, 1);
        assert_eq!(stats.unrecognized_providers, 1);
        let entries = records[0]
            .provider_ids
            .get(ProviderKey::Kodik, SourceRegistry::Kinopoisk);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Title 2");
    }

    #[test]
    fn test_record_serializes_flat_with_provider_ids() {
        let records = consolidate(vec![
            hit(5, "flixcdn").with_identifier(SourceRegistry::Imdb, "tt5"),
        ]);

        let value = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(value["id"], json!(5));
        assert_eq!(value["imdb_id"], json!("tt5"));
        assert_eq!(
            value["provider_ids"]["flixcdn"]["imdb"],
            json!([{"id": "tt5", "label": "Title 5"}])
        );
        assert!(value.get("members").is_none());
    }
}
