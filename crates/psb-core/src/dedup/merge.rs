//! Group merging and per-field conflict resolution.

use chrono::Utc;

use crate::model::{
    DataOrigin, DataQuality, Organisation, SourceId, Status,
};

/// Source precedence when no per-field chain says otherwise: registry order,
/// authoritative registers first.
const SOURCE_PRECEDENCE: &[SourceId] = &[
    SourceId::GovUkApi,
    SourceId::OnsInstitutional,
    SourceId::OnsNonInstitutional,
    SourceId::NhsProviderDirectory,
    SourceId::DefraUkAir,
    SourceId::Gias,
    SourceId::DevolvedAdminStatic,
    SourceId::PoliceUkApi,
    SourceId::Nfcc,
    SourceId::GovUkGuidance,
    SourceId::Aoc,
    SourceId::NiEducation,
    SourceId::UkCourtsCsv,
    SourceId::NiCourts,
    SourceId::ScottishCourts,
    SourceId::Groundwork,
    SourceId::NhsCharities,
    SourceId::WikipediaWelshCommunities,
    SourceId::WikipediaScottishCommunities,
    SourceId::NiHealth,
    SourceId::OnsUnitary,
    SourceId::WikipediaDistricts,
    SourceId::NationalparksUk,
    SourceId::NhsIcbs,
    SourceId::Healthwatch,
    SourceId::MygovScot,
    SourceId::NhsScotlandBoards,
    SourceId::TransportScotlandRtps,
    SourceId::LawGovWales,
    SourceId::InfrastructureNiPorts,
    SourceId::NiGovernment,
    SourceId::Ukri,
];

/// Documented per-field priority chains.
const NAME_TYPE_STATUS_CHAIN: &[SourceId] = &[
    SourceId::GovUkApi,
    SourceId::OnsInstitutional,
    SourceId::OnsNonInstitutional,
];
const CLASSIFICATION_CHAIN: &[SourceId] = &[
    SourceId::OnsInstitutional,
    SourceId::OnsNonInstitutional,
    SourceId::GovUkApi,
];
const PARENT_CHAIN: &[SourceId] = &[SourceId::GovUkApi, SourceId::OnsInstitutional];
const CONTROLLING_CHAIN: &[SourceId] = &[SourceId::OnsNonInstitutional, SourceId::OnsInstitutional];

fn precedence_rank(source: SourceId) -> usize {
    SOURCE_PRECEDENCE
        .iter()
        .position(|s| *s == source)
        .unwrap_or(SOURCE_PRECEDENCE.len())
}

/// Rank of `source` under a per-field chain: chain position first, then the
/// registry precedence for sources the chain does not mention.
fn field_rank(chain: &[SourceId], source: SourceId) -> usize {
    chain
        .iter()
        .position(|s| *s == source)
        .unwrap_or_else(|| chain.len() + precedence_rank(source))
}

fn primary_source(record: &Organisation) -> SourceId {
    record.sources.first().map_or(SourceId::GovUkApi, |s| s.source)
}

/// Pick a winning value by chain rank, breaking ties on longest value, then
/// lexicographically for determinism. Returns the winner and whether the
/// candidates actually conflicted.
fn resolve<'a>(
    chain: &[SourceId],
    candidates: &[(&'a str, SourceId)],
) -> (Option<&'a str>, bool) {
    let mut distinct: Vec<&str> = candidates.iter().map(|(v, _)| *v).collect();
    distinct.sort_unstable();
    distinct.dedup();
    let conflicted = distinct.len() > 1;

    let winner = candidates
        .iter()
        .min_by(|(va, sa), (vb, sb)| {
            field_rank(chain, *sa)
                .cmp(&field_rank(chain, *sb))
                .then(vb.len().cmp(&va.len()))
                .then(va.cmp(vb))
        })
        .map(|(v, _)| *v);
    (winner, conflicted)
}

/// Merge one group of records that refer to the same organisation.
///
/// `conflicts` is incremented once per scalar field whose candidates held
/// more than one distinct value.
#[must_use]
pub fn merge_group(records: Vec<Organisation>, conflicts: &mut usize) -> Organisation {
    debug_assert!(!records.is_empty());
    let mut records = records;
    if records.len() == 1 {
        let mut only = records.remove(0);
        finalise_quality(&mut only, DataOrigin::Live);
        return only;
    }

    // Deterministic base: the highest-precedence record, ties on id.
    let mut ordered: Vec<&Organisation> = records.iter().collect();
    ordered.sort_by(|a, b| {
        precedence_rank(primary_source(a))
            .cmp(&precedence_rank(primary_source(b)))
            .then_with(|| a.id.cmp(&b.id))
    });
    let base_id = ordered[0].id.clone();

    let with_source = |field: fn(&Organisation) -> Option<&str>| -> Vec<(&str, SourceId)> {
        ordered
            .iter()
            .filter_map(|r| field(r).map(|v| (v, primary_source(r))))
            .collect()
    };

    // Scalar fields under their documented chains.
    let (name, name_conflict) = resolve(
        NAME_TYPE_STATUS_CHAIN,
        &with_source(|r| Some(r.name.as_str())),
    );
    let (classification, class_conflict) = resolve(
        CLASSIFICATION_CHAIN,
        &with_source(|r| r.classification.as_deref()),
    );
    let (parent, parent_conflict) = resolve(
        PARENT_CHAIN,
        &with_source(|r| r.parent_organisation.as_deref()),
    );
    let (controlling, controlling_conflict) = resolve(
        CONTROLLING_CHAIN,
        &with_source(|r| r.controlling_unit.as_deref()),
    );
    let (website, website_conflict) =
        resolve(NAME_TYPE_STATUS_CHAIN, &with_source(|r| r.website.as_deref()));

    // Type follows the name/type/status chain.
    let type_candidates: Vec<_> = ordered
        .iter()
        .map(|r| (r.org_type, primary_source(r)))
        .collect();
    let org_type = type_candidates
        .iter()
        .min_by_key(|(_, source)| field_rank(NAME_TYPE_STATUS_CHAIN, *source))
        .map_or(crate::model::OrganisationType::Other, |(t, _)| *t);
    let type_conflict = {
        let mut types: Vec<_> = type_candidates.iter().map(|(t, _)| *t).collect();
        types.sort();
        types.dedup();
        types.len() > 1
    };

    // Status: a dissolution event with a date always wins; otherwise the most
    // recently retrieved source decides.
    let dissolved_with_date = ordered
        .iter()
        .find(|r| r.status == Status::Dissolved && r.dissolution_date.is_some());
    let status = dissolved_with_date.map_or_else(
        || {
            ordered
                .iter()
                .max_by_key(|r| r.sources.first().map(|s| s.retrieved_at))
                .map_or(Status::Active, |r| r.status)
        },
        |_| Status::Dissolved,
    );
    let status_conflict = {
        let mut statuses: Vec<_> = ordered.iter().map(|r| r.status).collect();
        statuses.sort_by_key(|s| s.as_str());
        statuses.dedup();
        statuses.len() > 1
    };

    // Dates: earliest establishment, latest dissolution.
    let mut establishment_date = ordered.iter().filter_map(|r| r.establishment_date).min();
    let mut dissolution_date = ordered.iter().filter_map(|r| r.dissolution_date).max();
    if let (Some(established), Some(dissolved)) = (establishment_date, dissolution_date) {
        if dissolved < established {
            // Sources disagree irreconcilably; the dissolution event is the
            // one downstream consumers act on, so the establishment goes.
            establishment_date = None;
        }
    }
    if status != Status::Dissolved {
        // A dissolution date only makes sense on a dissolved record.
        dissolution_date = None;
    }

    // Provenance: union in input order, one entry per source.
    let mut sources = Vec::new();
    for record in &records {
        for reference in &record.sources {
            if !sources
                .iter()
                .any(|s: &crate::model::DataSourceReference| s.source == reference.source)
            {
                sources.push(reference.clone());
            }
        }
    }

    // Alternative names: union, plus every primary name the merge rejected.
    let chosen_name = name.unwrap_or(&records[0].name).to_string();
    let mut alternative_names: Vec<String> = Vec::new();
    let mut push_alt = |candidate: &str| {
        if !candidate.eq_ignore_ascii_case(&chosen_name)
            && !alternative_names
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(candidate))
        {
            alternative_names.push(candidate.to_string());
        }
    };
    for record in &records {
        for alt in &record.alternative_names {
            push_alt(alt);
        }
    }
    for record in &records {
        push_alt(&record.name);
    }

    // Location and extras: first populated wins, ranked by precedence.
    let location = ordered
        .iter()
        .filter_map(|r| r.location.clone())
        .find(|l| !l.is_empty());
    let mut additional_properties = std::collections::BTreeMap::new();
    for record in &ordered {
        for (key, value) in &record.additional_properties {
            additional_properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    for conflicted in [
        name_conflict,
        class_conflict,
        parent_conflict,
        controlling_conflict,
        website_conflict,
        type_conflict,
        status_conflict,
    ] {
        if conflicted {
            *conflicts += 1;
        }
    }

    let origin = merged_origin(&records);
    let mut merged = Organisation {
        id: base_id,
        name: chosen_name,
        alternative_names,
        org_type,
        classification: classification.map(ToString::to_string),
        status,
        parent_organisation: parent.map(ToString::to_string),
        controlling_unit: controlling.map(ToString::to_string),
        location,
        establishment_date,
        dissolution_date,
        website: website.map(ToString::to_string),
        sources,
        additional_properties,
        data_quality: None,
        last_updated: Utc::now(),
    };
    finalise_quality(&mut merged, origin);
    merged
}

/// Best origin across the group: any live contribution makes the merged
/// record live, then cache, then fallback.
fn merged_origin(records: &[Organisation]) -> DataOrigin {
    let mut best = DataOrigin::Fallback;
    for record in records {
        match record.data_quality.as_ref().map(|q| q.source) {
            None | Some(DataOrigin::Live) => return DataOrigin::Live,
            Some(DataOrigin::Cache) => best = DataOrigin::Cache,
            Some(DataOrigin::Fallback) => {}
        }
    }
    best
}

fn finalise_quality(record: &mut Organisation, origin: DataOrigin) {
    let origin = record
        .data_quality
        .as_ref()
        .map_or(origin, |q| q.source);
    record.data_quality = Some(DataQuality {
        completeness: record.completeness(),
        source: origin,
    });
}
