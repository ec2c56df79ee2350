//! Canonical data model for aggregated public sector organisations.
//!
//! Every source driver maps its raw payload into [`Organisation`], the single
//! record type the rest of the engine operates on. The serialized shape is the
//! published artifact contract: camelCase field names, lowercase `snake_case`
//! enum tokens, and optional fields omitted entirely when absent.

mod classify;
mod dates;
mod source_id;
mod status;

pub use classify::{OrganisationType, infer_type_from_classification};
pub use dates::parse_date;
pub use source_id::SourceId;
pub use status::{Status, map_status};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum length of the primary display name.
pub const MAX_NAME_LEN: usize = 500;

/// Maximum length of the free-text classification label.
pub const MAX_CLASSIFICATION_LEN: usize = 200;

/// A canonical record for one UK public sector organisation.
///
/// Created by a source driver's map stage with exactly one provenance entry,
/// mutated only by the dedup engine's merge step, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    /// Stable opaque identifier, deterministic across runs for the same
    /// underlying organisation.
    pub id: String,

    /// Primary display name. Never empty after trimming.
    pub name: String,

    /// Acronyms, bilingual forms, and trading names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,

    /// Structural classification.
    #[serde(rename = "type")]
    pub org_type: OrganisationType,

    /// Source-specific category label, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,

    /// Operational status. Defaults to active when the source is silent.
    pub status: Status,

    /// Id or name of the parent organisation, when the source exposes a
    /// hierarchy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_organisation: Option<String>,

    /// Sponsoring or controlling entity for non-institutional units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controlling_unit: Option<String>,

    /// Geographic information, as much of it as the source exposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Date the organisation was established.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_date: Option<NaiveDate>,

    /// Date the organisation was dissolved. Never earlier than
    /// `establishment_date` when both are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dissolution_date: Option<NaiveDate>,

    /// Official website.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Provenance chain, in the order sources contributed. Never empty.
    pub sources: Vec<DataSourceReference>,

    /// Source-specific extras that have no canonical field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_properties: BTreeMap<String, serde_json::Value>,

    /// Quality annotations for downstream filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,

    /// Set when the record is created and refreshed at merge time.
    pub last_updated: DateTime<Utc>,
}

impl Organisation {
    /// Checks the canonical-model invariants that can be verified locally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first violated field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                field: "name",
                rule: "must not be empty after trimming".into(),
            });
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(Error::Validation {
                field: "name",
                rule: format!("must be at most {MAX_NAME_LEN} characters"),
            });
        }
        if let Some(classification) = &self.classification {
            if classification.chars().count() > MAX_CLASSIFICATION_LEN {
                return Err(Error::Validation {
                    field: "classification",
                    rule: format!("must be at most {MAX_CLASSIFICATION_LEN} characters"),
                });
            }
        }
        if self.sources.is_empty() {
            return Err(Error::Validation {
                field: "sources",
                rule: "must contain at least one data source reference".into(),
            });
        }
        if let (Some(established), Some(dissolved)) =
            (self.establishment_date, self.dissolution_date)
        {
            if dissolved < established {
                return Err(Error::Validation {
                    field: "dissolutionDate",
                    rule: "must not be earlier than establishmentDate".into(),
                });
            }
        }
        Ok(())
    }

    /// Fraction of canonical fields that are populated, in `[0, 1]`.
    ///
    /// The denominator is the fixed set of thirteen canonical fields, so the
    /// score is comparable across records and across runs.
    #[must_use]
    pub fn completeness(&self) -> f64 {
        let populated = [
            !self.id.is_empty(),
            !self.name.trim().is_empty(),
            !self.alternative_names.is_empty(),
            true, // org_type is always set
            self.classification.is_some(),
            true, // status is always set
            self.parent_organisation.is_some(),
            self.controlling_unit.is_some(),
            self.location.as_ref().is_some_and(|l| !l.is_empty()),
            self.establishment_date.is_some(),
            self.dissolution_date.is_some(),
            self.website.is_some(),
            !self.sources.is_empty(),
        ];
        let count = populated.iter().filter(|p| **p).count();
        #[allow(clippy::cast_precision_loss)]
        {
            count as f64 / populated.len() as f64
        }
    }
}

/// Geographic sub-record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Country within the UK ("England", "Scotland", "Wales",
    /// "Northern Ireland") or "United Kingdom".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region or county.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Street address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// WGS84 coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// True when no field is populated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.region.is_none()
            && self.address.is_none()
            && self.postal_code.is_none()
            && self.coordinates.is_none()
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Where a record's data ultimately came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Fetched from the live source during this run.
    Live,
    /// Taken from an embedded fallback dataset after a live fetch failed.
    Fallback,
    /// Served from the on-disk fetch cache.
    Cache,
}

/// Quality annotations attached by the map and merge stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// Fraction of canonical fields that are populated, in `[0, 1]`.
    pub completeness: f64,
    /// Provenance class of the underlying payload.
    pub source: DataOrigin,
}

/// One entry in a record's provenance chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceReference {
    /// Which registered source produced this data.
    pub source: SourceId,
    /// When the payload was retrieved.
    pub retrieved_at: DateTime<Utc>,
    /// URL the payload was fetched from, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Driver's confidence in the mapping, in `[0, 1]`.
    pub confidence: f64,
}

/// Per-source metadata collected by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// Which source this entry describes.
    pub source: SourceId,
    /// Primary URL the driver fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// When the driver completed its fetch.
    pub retrieved_at: DateTime<Utc>,
    /// Records emitted by the map stage, before dedup.
    pub record_count: usize,
    /// Wall-clock driver duration in milliseconds.
    pub duration_ms: u64,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Number of organisations in the artifact.
    pub total_organisations: usize,
    /// Records merged away by deduplication.
    pub duplicates_found: usize,
    /// Field conflicts resolved during merging.
    pub conflicts_detected: usize,
    /// Record counts keyed by organisation type token.
    pub organisations_by_type: BTreeMap<String, usize>,
}

/// Run-level metadata published alongside the organisations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    /// When the run finished processing.
    pub processed_at: DateTime<Utc>,
    /// One entry per source that contributed records.
    pub sources: Vec<SourceMetadata>,
    /// Aggregate statistics.
    pub statistics: Statistics,
}
