//! Weighted record similarity for the fuzzy cross-check.
//!
//! Key-based grouping catches exact matches after normalisation; this pass
//! catches near-misses inside a (type, country) bucket. Field similarities
//! are weighted, combined over the fields both records actually carry, and
//! an exact strong-id match short-circuits everything.

use strsim::normalized_levenshtein;

use super::normalize::{normalize_name, strong_id};
use crate::model::Organisation;

/// Combined similarity at or above this makes a pair a duplicate.
pub const DUPLICATE_THRESHOLD: f64 = 0.9;

/// Alternative-name similarity counts as a match at this threshold.
const ALT_NAME_THRESHOLD: f64 = 0.85;

const WEIGHT_ID: f64 = 2.0;
const WEIGHT_NAME: f64 = 1.5;
const WEIGHT_ALT_NAMES: f64 = 1.2;
const WEIGHT_PARENT: f64 = 0.8;
const WEIGHT_CLASSIFICATION: f64 = 0.6;
const WEIGHT_TYPE: f64 = 0.5;
const WEIGHT_LOCATION: f64 = 0.3;

/// Weighted similarity of two records in `[0, 1]`.
#[must_use]
pub fn record_similarity(a: &Organisation, b: &Organisation) -> f64 {
    if let (Some(id_a), Some(id_b)) = (strong_id(a), strong_id(b)) {
        if id_a == id_b {
            return 1.0;
        }
    }

    let mut score = 0.0;
    let mut total_weight = 0.0;
    let mut add = |weight: f64, similarity: f64| {
        score += weight * similarity;
        total_weight += weight;
    };

    // Numbered names are edit-distance traps: "Area 1 Board" and
    // "Area 2 Board" differ by one character and name different bodies.
    let name_a = normalize_name(&a.name);
    let name_b = normalize_name(&b.name);
    let digit_clash = numbers_conflict(&name_a, &name_b);

    add(
        WEIGHT_ID,
        if digit_clash {
            0.0
        } else {
            text_similarity(&a.id, &b.id)
        },
    );
    add(
        WEIGHT_NAME,
        if digit_clash {
            0.0
        } else {
            text_similarity(&name_a, &name_b)
        },
    );

    if !a.alternative_names.is_empty() || !b.alternative_names.is_empty() {
        let alt = alt_name_similarity(a, b);
        add(WEIGHT_ALT_NAMES, if alt >= ALT_NAME_THRESHOLD { alt } else { 0.0 });
    }
    if let (Some(pa), Some(pb)) = (&a.parent_organisation, &b.parent_organisation) {
        add(
            WEIGHT_PARENT,
            text_similarity(&normalize_name(pa), &normalize_name(pb)),
        );
    }
    if let (Some(ca), Some(cb)) = (&a.classification, &b.classification) {
        add(
            WEIGHT_CLASSIFICATION,
            text_similarity(&ca.to_lowercase(), &cb.to_lowercase()),
        );
    }
    add(
        WEIGHT_TYPE,
        if a.org_type == b.org_type { 1.0 } else { 0.0 },
    );
    if let (Some(la), Some(lb)) = (&a.location, &b.location) {
        let same_country = match (&la.country, &lb.country) {
            (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
            _ => false,
        };
        add(WEIGHT_LOCATION, if same_country { 1.0 } else { 0.0 });
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    score / total_weight
}

/// True when the pair is close enough to merge.
#[must_use]
pub fn is_duplicate(a: &Organisation, b: &Organisation) -> bool {
    record_similarity(a, b) >= DUPLICATE_THRESHOLD
}

fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b)
}

/// True when the two strings carry different numeric tokens.
fn numbers_conflict(a: &str, b: &str) -> bool {
    let digits = |s: &str| -> Vec<String> {
        s.split_whitespace()
            .filter(|token| token.chars().all(|c| c.is_ascii_digit()))
            .map(ToString::to_string)
            .collect()
    };
    digits(a) != digits(b)
}

/// Best cross-match over the two records' full name sets.
fn alt_name_similarity(a: &Organisation, b: &Organisation) -> f64 {
    let names_a = name_set(a);
    let names_b = name_set(b);
    let mut best: f64 = 0.0;
    for na in &names_a {
        for nb in &names_b {
            best = best.max(text_similarity(na, nb));
        }
    }
    best
}

fn name_set(record: &Organisation) -> Vec<String> {
    std::iter::once(&record.name)
        .chain(record.alternative_names.iter())
        .map(|n| normalize_name(n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{base_record, source_ref};
    use crate::model::{OrganisationType, SourceId};

    fn record(id: &str, name: &str) -> Organisation {
        base_record(
            id.to_string(),
            name.to_string(),
            OrganisationType::Other,
            source_ref(SourceId::GovUkApi, None, 1.0),
        )
    }

    #[test]
    fn identical_records_score_high() {
        let a = record("met-office", "Met Office");
        let b = record("met-office", "The Met Office");
        assert!(record_similarity(&a, &b) > 0.95);
        assert!(is_duplicate(&a, &b));
    }

    #[test]
    fn unrelated_records_score_low() {
        let a = record("met-office", "Met Office");
        let b = record("environment-agency", "Environment Agency");
        assert!(record_similarity(&a, &b) < 0.5);
        assert!(!is_duplicate(&a, &b));
    }

    #[test]
    fn strong_id_match_short_circuits() {
        let mut a = record("x", "Completely Different Name");
        a.additional_properties
            .insert("onsCode".into(), "E06000001".into());
        let mut b = record("y", "Hartlepool Borough Council");
        b.additional_properties
            .insert("onsCode".into(), "E06000001".into());
        assert!((record_similarity(&a, &b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn alternative_names_carry_a_match() {
        let a = record("mo", "Meteorological Office");
        let mut b = record("met-office-2", "Met Office");
        b.alternative_names.push("Meteorological Office".into());
        let sim = record_similarity(&a, &b);
        let mut c = record("met-office-3", "Met Office");
        c.alternative_names.push("Weather Service".into());
        assert!(sim > record_similarity(&a, &c));
    }

    #[test]
    fn numbered_names_never_cross_merge() {
        let a = record("area-1-board", "Area 1 Board");
        let b = record("area-2-board", "Area 2 Board");
        assert!(!is_duplicate(&a, &b));

        // Same number is no obstacle.
        let c = record("area-1-board", "Area 1 Board");
        assert!(is_duplicate(&a, &c));
    }

    #[test]
    fn differing_types_drag_the_score_down() {
        let a = record("winchester", "Winchester");
        let mut b = record("winchester", "Winchester");
        b.org_type = OrganisationType::Court;
        assert!(record_similarity(&a, &b) < 1.0);
    }
}
