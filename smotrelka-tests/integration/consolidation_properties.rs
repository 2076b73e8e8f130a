//! Property tests for consolidation and paging.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use smotrelka_search::consolidation::{display_label, extract_identifiers};
use smotrelka_search::{ProviderKey, RawHit, SourceRegistry, consolidate, consolidate_with_stats, paginate};
use smotrelka_tests::{hit, sample_catalog};

const PROVIDERS: [&str; 6] = ["turbo", "flixcdn", "lumex/hd", "kodik", "collaps", ""];

/// Hits drawn from a tiny identifier space so that collisions are common.
fn arb_hits() -> impl Strategy<Value = Vec<RawHit>> {
    let arb_hit = (
        0..PROVIDERS.len(),
        proptest::collection::vec(proptest::option::weighted(0.3, 0u8..4), SourceRegistry::COUNT),
        0u8..3,
    );
    proptest::collection::vec(arb_hit, 0..24).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(position, (provider, values, title))| {
                let ids: Vec<(SourceRegistry, String)> = SourceRegistry::ALL
                    .into_iter()
                    .zip(values)
                    .filter_map(|(registry, value)| value.map(|v| (registry, format!("v{v}"))))
                    .collect();
                let borrowed: Vec<(SourceRegistry, &str)> =
                    ids.iter().map(|(r, v)| (*r, v.as_str())).collect();
                hit(position as u64, PROVIDERS[provider], &format!("Title {title}"), &borrowed)
            })
            .collect()
    })
}

/// Partition computed the slow way: repeated merging of overlapping groups.
fn reference_classes(hits: &[RawHit]) -> BTreeSet<BTreeSet<u64>> {
    let ids: Vec<_> = hits.iter().map(extract_identifiers).collect();
    let mut groups: Vec<BTreeSet<usize>> = (0..hits.len()).map(|i| BTreeSet::from([i])).collect();

    loop {
        let mut merged = false;
        'outer: for a in 0..groups.len() {
            for b in (a + 1)..groups.len() {
                let connected = groups[a].iter().any(|&i| {
                    groups[b].iter().any(|&j| {
                        SourceRegistry::ALL.into_iter().any(|registry| {
                            matches!((ids[i].get(registry), ids[j].get(registry)), (Some(x), Some(y)) if x == y)
                        })
                    })
                });
                if connected {
                    let absorbed = groups.remove(b);
                    groups[a].extend(absorbed);
                    merged = true;
                    break 'outer;
                }
            }
        }
        if !merged {
            break;
        }
    }

    groups
        .into_iter()
        .map(|group| group.into_iter().map(|i| hits[i].id).collect())
        .collect()
}

fn classes_of(hits: &[RawHit]) -> BTreeSet<BTreeSet<u64>> {
    consolidate(hits.to_vec())
        .into_iter()
        .map(|record| record.members.iter().map(|&m| hits[m].id).collect())
        .collect()
}

proptest! {
    #[test]
    fn prop_every_hit_lands_in_exactly_one_record(hits in arb_hits()) {
        let records = consolidate(hits.clone());

        let mut seen: Vec<usize> = records.iter().flat_map(|r| r.members.iter().copied()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..hits.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_classes_match_transitive_closure(hits in arb_hits()) {
        prop_assert_eq!(classes_of(&hits), reference_classes(&hits));
    }

    #[test]
    fn prop_classes_do_not_depend_on_input_order(
        (hits, shuffled) in arb_hits().prop_flat_map(|hits| {
            let original = hits.clone();
            Just(hits).prop_shuffle().prop_map(move |shuffled| (original.clone(), shuffled))
        })
    ) {
        prop_assert_eq!(classes_of(&hits), classes_of(&shuffled));
    }

    #[test]
    fn prop_representative_is_first_member_in_input_order(hits in arb_hits()) {
        let records = consolidate(hits.clone());

        let mut previous = None;
        for record in &records {
            let first = record.members[0];
            prop_assert!(record.members.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(&record.hit, &hits[first]);
            prop_assert!(previous.is_none_or(|p| p < first));
            previous = Some(first);
        }
    }

    #[test]
    fn prop_provider_index_lists_each_identifier_once_with_first_label(hits in arb_hits()) {
        let (records, stats) = consolidate_with_stats(hits.clone());
        let mut unrecognized = 0;

        for record in &records {
            for provider in ProviderKey::ALL {
                for registry in SourceRegistry::ALL {
                    let entries = record.provider_ids.get(provider, registry);
                    let unique: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
                    prop_assert_eq!(unique.len(), entries.len());

                    // Expected: identifiers of members from this provider, first label wins
                    let mut expected: Vec<(String, String)> = Vec::new();
                    for &m in &record.members {
                        let member = &hits[m];
                        if ProviderKey::normalize(member.provider.as_deref().unwrap_or_default()) != Some(provider) {
                            continue;
                        }
                        if let Some(id) = extract_identifiers(member).get(registry)
                            && !expected.iter().any(|(seen, _)| seen == id)
                        {
                            expected.push((id.to_string(), display_label(member)));
                        }
                    }
                    let actual: Vec<(String, String)> =
                        entries.iter().map(|e| (e.id.clone(), e.label.clone())).collect();
                    prop_assert_eq!(actual, expected);
                }
            }
            unrecognized += record
                .members
                .iter()
                .filter(|&&m| ProviderKey::normalize(hits[m].provider.as_deref().unwrap_or_default()).is_none())
                .count();
        }

        prop_assert_eq!(stats.unrecognized_providers, unrecognized);
        prop_assert_eq!(stats.classes, records.len());
    }

    #[test]
    fn prop_pagination_bounds(len in 0usize..50, offset in 0usize..60, limit in 1usize..20) {
        let page = paginate((0..len).collect::<Vec<_>>(), offset, limit);

        prop_assert_eq!(page.hits.len(), limit.min(len.saturating_sub(offset)));
        prop_assert_eq!(page.has_more, len > offset + limit);
        if let Some(&first) = page.hits.first() {
            prop_assert_eq!(first, offset);
        }
    }
}

#[test]
fn test_sample_catalog_consolidation() {
    let records = consolidate(sample_catalog());

    let representatives: Vec<u64> = records.iter().map(|r| r.hit.id).collect();
    assert_eq!(representatives, vec![1, 4, 5, 6]);

    let matrix = &records[0].provider_ids;
    assert_eq!(matrix.get(ProviderKey::Kodik, SourceRegistry::Imdb)[0].label, "Матрица (1999)");
    assert_eq!(matrix.get(ProviderKey::Turbo, SourceRegistry::Kinopoisk)[0].id, "301");
    assert_eq!(matrix.get(ProviderKey::Lumex, SourceRegistry::Kinopoisk)[0].label, "Matrix, The (1999)");
    assert_eq!(matrix.get(ProviderKey::Lumex, SourceRegistry::Imdb)[0].id, "tt0133093");

    // worldart_id 0 is absent, so only shikimori is indexed
    let animatrix = &records[2].provider_ids;
    assert_eq!(animatrix.get(ProviderKey::Kodik, SourceRegistry::Shikimori)[0].id, "1124");
    assert!(animatrix.get(ProviderKey::Kodik, SourceRegistry::Worldart).is_empty());

    // identical title without identifiers stays on its own
    assert!(records[3].provider_ids.is_empty());
}

#[test]
fn test_pagination_boundary_at_length() {
    let records = consolidate(sample_catalog());
    let len = records.len();

    let page = paginate(records.clone(), len, 5);
    assert!(page.hits.is_empty());
    assert!(!page.has_more);

    let page = paginate(records, 0, len - 1);
    assert!(page.has_more);
}
