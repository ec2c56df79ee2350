//! Artifact assembly and atomic output.
//!
//! The artifact is one JSON document, `{ organisations, metadata }`. The
//! writer creates the output directory, writes through a temp file and
//! rename, then reparses what landed on disk and checks the top-level shape
//! so a truncated or interleaved write can never ship.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Organisation, ProcessingMetadata};
use crate::{Error, Result};

/// Default artifact path, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "dist/orgs.json";

/// The published artifact shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct Artifact {
    /// Deduplicated canonical records.
    pub organisations: Vec<Organisation>,
    /// Run metadata and statistics.
    pub metadata: ProcessingMetadata,
}

/// Write the artifact to `path`.
///
/// # Errors
///
/// Fails on I/O problems, serialization problems, or when post-write
/// validation finds the on-disk document malformed.
pub fn write_artifact(
    path: &Path,
    organisations: Vec<Organisation>,
    metadata: ProcessingMetadata,
    pretty: bool,
) -> Result<()> {
    let artifact = Artifact {
        organisations,
        metadata,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = if pretty {
        serde_json::to_string_pretty(&artifact)?
    } else {
        serde_json::to_string(&artifact)?
    };

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)?;
    fs::rename(&tmp_path, path)?;

    validate_written(path)?;
    info!(
        path = %path.display(),
        organisations = artifact.organisations.len(),
        bytes = json.len(),
        "artifact written"
    );
    Ok(())
}

/// Reparse the written file and check the top-level contract.
fn validate_written(path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    if !value
        .get("organisations")
        .is_some_and(serde_json::Value::is_array)
    {
        return Err(Error::Validation {
            field: "organisations",
            rule: "written artifact must contain an organisations array".into(),
        });
    }
    let metadata = value.get("metadata").ok_or(Error::Validation {
        field: "metadata",
        rule: "written artifact must contain metadata".into(),
    })?;
    for key in ["processedAt", "sources", "statistics"] {
        if metadata.get(key).is_none() {
            return Err(Error::Validation {
                field: "metadata",
                rule: format!("metadata must contain '{key}'"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{base_record, source_ref};
    use crate::model::{OrganisationType, SourceId, Statistics};
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_metadata() -> ProcessingMetadata {
        ProcessingMetadata {
            processed_at: Utc::now(),
            sources: vec![],
            statistics: Statistics::default(),
        }
    }

    fn sample_records() -> Vec<Organisation> {
        vec![base_record(
            "govuk-ofgem".into(),
            "Ofgem".into(),
            OrganisationType::Ndpb,
            source_ref(SourceId::GovUkApi, None, 1.0),
        )]
    }

    #[test]
    fn writes_and_validates_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dist").join("orgs.json");

        write_artifact(&path, sample_records(), sample_metadata(), true).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let artifact: Artifact = serde_json::from_str(&raw).unwrap();
        assert_eq!(artifact.organisations.len(), 1);
        assert_eq!(artifact.organisations[0].name, "Ofgem");
        // Pretty printing was requested.
        assert!(raw.contains('\n'));
        // No temp file left behind.
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn compact_output_when_pretty_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orgs.json");
        write_artifact(&path, sample_records(), sample_metadata(), false).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }

    #[test]
    fn validation_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orgs.json");
        fs::write(&path, "{\"organisations\": 7}").unwrap();
        assert!(validate_written(&path).is_err());

        fs::write(&path, "{\"organisations\": [], \"metadata\": {}}").unwrap();
        assert!(validate_written(&path).is_err());
    }

    #[test]
    fn overwrites_existing_artifact_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orgs.json");
        write_artifact(&path, sample_records(), sample_metadata(), false).unwrap();
        write_artifact(&path, vec![], sample_metadata(), false).unwrap();
        let artifact: Artifact =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(artifact.organisations.is_empty());
    }
}
