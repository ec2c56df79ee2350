//! Deduplication and conflict resolution.
//!
//! Records are grouped by [`merge_key`], near-misses inside a
//! (type, country) bucket are caught by the weighted similarity cross-check,
//! and each group collapses through the per-field priority merge. Grouping
//! and merging repeat until no two records share a key, so the engine is
//! idempotent and the no-shared-`mergeKey` invariant holds by construction.

mod merge;
mod normalize;
mod similarity;

pub use merge::merge_group;
pub use normalize::{merge_key, normalize_name, strong_id};
pub use similarity::{DUPLICATE_THRESHOLD, is_duplicate, record_similarity};

use std::collections::HashMap;

use tracing::debug;

use crate::model::Organisation;

/// Buckets larger than this skip the pairwise cross-check; they are uniform
/// registers (schools, communities) where key grouping already suffices and
/// a quadratic scan would dominate the run.
const FUZZY_BUCKET_LIMIT: usize = 200;

/// Result of one deduplication pass over the full record set.
#[derive(Debug)]
pub struct DedupOutcome {
    /// Merged records, sorted by canonical id.
    pub organisations: Vec<Organisation>,
    /// Records that went in.
    pub original_count: usize,
    /// Records that came out.
    pub deduplicated_count: usize,
    /// Records merged away.
    pub duplicates_found: usize,
    /// Scalar field conflicts resolved while merging.
    pub conflicts_detected: usize,
}

/// Deduplicate the union of all drivers' records.
#[must_use]
pub fn deduplicate(records: Vec<Organisation>) -> DedupOutcome {
    let original_count = records.len();
    let mut conflicts = 0;

    let mut current = records;
    // Merging can change a record's name or type and therefore its key, so
    // regroup until stable. Two or three rounds settle real inputs; the cap
    // guards against a pathological flip-flop.
    for round in 0..8 {
        let groups = group_by_key(current);
        let fuzzy_groups = cross_check(groups);
        let stable = fuzzy_groups.iter().all(|group| group.len() == 1);
        current = fuzzy_groups
            .into_iter()
            .map(|group| merge_group(group, &mut conflicts))
            .collect();
        if stable {
            debug!(round, "dedup reached fixpoint");
            break;
        }
    }

    current.sort_by(|a, b| a.id.cmp(&b.id));
    let deduplicated_count = current.len();
    DedupOutcome {
        organisations: current,
        original_count,
        deduplicated_count,
        duplicates_found: original_count - deduplicated_count,
        conflicts_detected: conflicts,
    }
}

/// Group records by merge key, preserving first-seen key order.
fn group_by_key(records: Vec<Organisation>) -> Vec<Vec<Organisation>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Organisation>> = HashMap::new();
    for record in records {
        let key = merge_key(&record);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record);
    }
    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

/// Merge groups whose representatives are near-duplicates within the same
/// (type, country) bucket.
fn cross_check(groups: Vec<Vec<Organisation>>) -> Vec<Vec<Organisation>> {
    // Bucket group indices by (type, country).
    let mut buckets: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (index, group) in groups.iter().enumerate() {
        let Some(representative) = group.first() else {
            continue;
        };
        let country = representative
            .location
            .as_ref()
            .and_then(|l| l.country.clone())
            .unwrap_or_default()
            .to_lowercase();
        buckets
            .entry((representative.org_type.as_str().to_string(), country))
            .or_default()
            .push(index);
    }

    // Union-find over group indices.
    let mut parent: Vec<usize> = (0..groups.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut walk = i;
        while parent[walk] != root {
            let next = parent[walk];
            parent[walk] = root;
            walk = next;
        }
        root
    }

    for indices in buckets.values() {
        if indices.len() > FUZZY_BUCKET_LIMIT {
            continue;
        }
        for (offset, &a) in indices.iter().enumerate() {
            for &b in &indices[offset + 1..] {
                let (Some(ra), Some(rb)) = (groups[a].first(), groups[b].first()) else {
                    continue;
                };
                if is_duplicate(ra, rb) {
                    let root_a = find(&mut parent, a);
                    let root_b = find(&mut parent, b);
                    if root_a != root_b {
                        parent[root_b] = root_a;
                    }
                }
            }
        }
    }

    // Collapse unions, keeping first-seen order.
    let mut merged: Vec<Vec<Organisation>> = Vec::new();
    let mut root_to_position: HashMap<usize, usize> = HashMap::new();
    for (index, group) in groups.into_iter().enumerate() {
        let root = find(&mut parent, index);
        if let Some(&position) = root_to_position.get(&root) {
            merged[position].extend(group);
        } else {
            root_to_position.insert(root, merged.len());
            merged.push(group);
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{base_record, slug_id, source_ref};
    use crate::model::{OrganisationType, SourceId, Status};
    use chrono::NaiveDate;

    fn record(name: &str, org_type: OrganisationType, source: SourceId) -> Organisation {
        base_record(
            slug_id("", name),
            name.to_string(),
            org_type,
            source_ref(source, None, 1.0),
        )
    }

    #[test]
    fn cross_source_records_merge_with_priority_resolution() {
        // S1: gov.uk wins type, ONS wins classification, both sources kept.
        let gov = record(
            "Department for Transport",
            OrganisationType::MinisterialDepartment,
            SourceId::GovUkApi,
        );
        let mut ons = record(
            "Department for Transport",
            OrganisationType::MinisterialDepartment,
            SourceId::OnsInstitutional,
        );
        ons.classification = Some("Central Government".into());

        let outcome = deduplicate(vec![gov, ons]);
        assert_eq!(outcome.deduplicated_count, 1);
        assert_eq!(outcome.duplicates_found, 1);

        let merged = &outcome.organisations[0];
        assert_eq!(merged.org_type, OrganisationType::MinisterialDepartment);
        assert_eq!(merged.classification.as_deref(), Some("Central Government"));
        let provenance: Vec<_> = merged.sources.iter().map(|s| s.source).collect();
        assert_eq!(
            provenance,
            vec![SourceId::GovUkApi, SourceId::OnsInstitutional]
        );
    }

    #[test]
    fn status_precedence_prefers_dated_dissolution() {
        // S2: one active, one dissolved with a date.
        let active = record(
            "Audit Commission",
            OrganisationType::ExecutiveNdpb,
            SourceId::GovUkApi,
        );
        let mut dissolved = record(
            "Audit Commission",
            OrganisationType::ExecutiveNdpb,
            SourceId::OnsInstitutional,
        );
        dissolved.status = Status::Dissolved;
        dissolved.dissolution_date = NaiveDate::from_ymd_opt(2020, 4, 1);

        let outcome = deduplicate(vec![active, dissolved]);
        let merged = &outcome.organisations[0];
        assert_eq!(merged.status, Status::Dissolved);
        assert_eq!(merged.dissolution_date, NaiveDate::from_ymd_opt(2020, 4, 1));
    }

    #[test]
    fn stopword_variants_collapse_and_union_alt_names() {
        // S5: "The Met Office" and "Met Office" are one organisation.
        let with_article = record("The Met Office", OrganisationType::Other, SourceId::GovUkApi);
        let mut bare = record("Met Office", OrganisationType::Other, SourceId::OnsInstitutional);
        bare.alternative_names.push("MO".into());

        let outcome = deduplicate(vec![with_article, bare]);
        assert_eq!(outcome.deduplicated_count, 1);
        let merged = &outcome.organisations[0];
        assert!(merged.alternative_names.iter().any(|n| n == "MO"));
    }

    #[test]
    fn different_types_do_not_merge() {
        let authority = record("Winchester", OrganisationType::LocalAuthority, SourceId::GovUkApi);
        let court = record("Winchester", OrganisationType::Court, SourceId::UkCourtsCsv);
        let outcome = deduplicate(vec![authority, court]);
        assert_eq!(outcome.deduplicated_count, 2);
    }

    #[test]
    fn no_two_outputs_share_a_merge_key() {
        let records = vec![
            record("The Met Office", OrganisationType::Other, SourceId::GovUkApi),
            record("Met Office", OrganisationType::Other, SourceId::OnsInstitutional),
            record("Met Office", OrganisationType::Other, SourceId::MygovScot),
            record("Environment Agency", OrganisationType::ExecutiveNdpb, SourceId::GovUkApi),
        ];
        let outcome = deduplicate(records);
        let mut keys: Vec<_> = outcome.organisations.iter().map(merge_key).collect();
        keys.sort();
        let before = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn dedup_is_idempotent() {
        let records = vec![
            record("The Met Office", OrganisationType::Other, SourceId::GovUkApi),
            record("Met Office", OrganisationType::Other, SourceId::OnsInstitutional),
            record("Ofgem", OrganisationType::Ndpb, SourceId::GovUkApi),
        ];
        let once = deduplicate(records);
        let twice = deduplicate(once.organisations.clone());
        assert_eq!(twice.duplicates_found, 0);

        let ids_once: Vec<_> = once.organisations.iter().map(|r| r.id.clone()).collect();
        let ids_twice: Vec<_> = twice.organisations.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn output_is_sorted_by_id() {
        let records = vec![
            record("Zebra Body", OrganisationType::Other, SourceId::GovUkApi),
            record("Alpha Body", OrganisationType::Other, SourceId::GovUkApi),
            record("Middle Body", OrganisationType::Other, SourceId::GovUkApi),
        ];
        let outcome = deduplicate(records);
        let ids: Vec<_> = outcome.organisations.iter().map(|r| r.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    proptest::proptest! {
        #[test]
        fn dedup_of_dedup_is_a_fixpoint(names in proptest::collection::vec("[a-z]{3,12}( [a-z]{3,12}){0,2}", 1..40)) {
            let records: Vec<_> = names
                .iter()
                .map(|name| record(name, OrganisationType::Other, SourceId::GovUkApi))
                .collect();
            let once = deduplicate(records);
            let twice = deduplicate(once.organisations.clone());
            proptest::prop_assert_eq!(twice.duplicates_found, 0);
            proptest::prop_assert_eq!(once.organisations.len(), twice.organisations.len());
        }
    }

    #[test]
    fn strong_id_merges_despite_different_names() {
        let mut a = record(
            "Hartlepool Borough Council",
            OrganisationType::UnitaryAuthority,
            SourceId::OnsUnitary,
        );
        a.additional_properties
            .insert("onsCode".into(), "E06000001".into());
        let mut b = record(
            "Hartlepool",
            OrganisationType::UnitaryAuthority,
            SourceId::DefraUkAir,
        );
        b.additional_properties
            .insert("onsCode".into(), "E06000001".into());

        let outcome = deduplicate(vec![a, b]);
        assert_eq!(outcome.deduplicated_count, 1);
    }
}
