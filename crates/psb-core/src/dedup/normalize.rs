//! Name normalisation and merge-key derivation.

use crate::model::Organisation;

/// Stopwords dropped from normalised names.
const STOPWORDS: &[&str] = &["the", "of", "and", "for", "uk", "british"];

/// Abbreviation expansions applied token-by-token.
const EXPANSIONS: &[(&str, &str)] = &[
    ("dept", "department"),
    ("org", "organisation"),
    ("assoc", "association"),
    ("comm", "commission"),
    ("corp", "corporation"),
    ("ltd", "limited"),
    ("plc", "public limited company"),
];

/// Normalise a display name for matching: lowercase, `&` to `and`,
/// punctuation stripped, abbreviations expanded, stopwords dropped,
/// whitespace collapsed.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    let mut tokens = Vec::new();
    for raw_token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if raw_token.is_empty() {
            continue;
        }
        let token = EXPANSIONS
            .iter()
            .find(|(abbr, _)| *abbr == raw_token)
            .map_or(raw_token, |(_, full)| *full);
        if STOPWORDS.contains(&token) {
            continue;
        }
        tokens.push(token);
    }
    tokens.join(" ")
}

/// A strong cross-source identifier, when the record carries one.
///
/// ONS codes and school URNs identify the same real-world body across
/// sources; records sharing one merge regardless of how their names differ.
#[must_use]
pub fn strong_id(record: &Organisation) -> Option<(&'static str, String)> {
    if let Some(code) = record
        .additional_properties
        .get("onsCode")
        .and_then(serde_json::Value::as_str)
    {
        return Some(("ons", code.to_string()));
    }
    if let Some(urn) = record.id.strip_prefix("gias-") {
        return Some(("urn", urn.to_string()));
    }
    None
}

/// Deterministic grouping key for the dedup engine.
///
/// Strong identifiers win outright; otherwise the normalised name scoped by
/// country and structural type, so same-named bodies in different nations or
/// of different kinds never collapse into each other.
#[must_use]
pub fn merge_key(record: &Organisation) -> String {
    if let Some((kind, value)) = strong_id(record) {
        return format!("{kind}:{value}");
    }
    let country = record
        .location
        .as_ref()
        .and_then(|l| l.country.as_deref())
        .unwrap_or("");
    format!(
        "name:{}|{}|{}",
        normalize_name(&record.name),
        country.to_lowercase(),
        record.org_type.as_str()
    )
}
