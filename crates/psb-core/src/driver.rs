//! The uniform contract every source driver implements.
//!
//! A driver owns one external data source end to end: fetch via the shared
//! HTTP capability, parse with the decoders, map into canonical records. The
//! orchestrator only ever sees [`Driver::fetch_and_map`] and the
//! [`DriverReport`] it returns; everything source-idiosyncratic stays behind
//! the trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::FetchCache;
use crate::fetch::{FetchOptions, FetchedPayload, HttpClient};
use crate::model::{
    DataOrigin, DataSourceReference, Organisation, SourceId, SourceMetadata, Status,
};
use crate::{Error, Result, decode};

/// Everything a driver needs for one run: capabilities, per-request options,
/// and the run's cancellation token. Drivers hold no other shared state.
#[derive(Clone)]
pub struct DriverContext {
    /// Shared HTTP capability.
    pub http: Arc<HttpClient>,
    /// Fetch cache; `None` unless `--cache` was given.
    pub cache: Option<FetchCache>,
    /// Options applied to every request this driver makes.
    pub fetch_options: FetchOptions,
    /// Run-wide cancellation token.
    pub cancel: CancellationToken,
}

impl DriverContext {
    /// Bail out if cancellation was requested. Drivers call this between
    /// sub-steps so long decodes stop promptly.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Fetch a URL live.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPayload> {
        self.http.get(url, &self.fetch_options, &self.cancel).await
    }

    /// Fetch a URL live with an `Accept` header.
    pub async fn fetch_accept(&self, url: &str, accept: &str) -> Result<FetchedPayload> {
        let opts = FetchOptions {
            accept: Some(accept.to_string()),
            ..self.fetch_options.clone()
        };
        self.http.get(url, &opts, &self.cancel).await
    }

    /// Fetch a text payload, consulting the cache under `cache_key` when
    /// caching is enabled. Returns the payload and where it came from.
    pub async fn fetch_text_cached(
        &self,
        cache_key: &str,
        url: &str,
    ) -> Result<(String, DataOrigin)> {
        if let Some(cache) = &self.cache {
            if let Some(Value::String(text)) = cache.load(cache_key) {
                return Ok((text, DataOrigin::Cache));
            }
        }
        let text = self.fetch(url).await?.text();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(cache_key, Value::String(text.clone())) {
                warn!(cache_key, "cache write failed: {e}");
            }
        }
        Ok((text, DataOrigin::Live))
    }

    /// Fetch and parse a JSON payload, consulting the cache under
    /// `cache_key` when caching is enabled.
    pub async fn fetch_json_cached(
        &self,
        cache_key: &str,
        url: &str,
    ) -> Result<(Value, DataOrigin)> {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.load(cache_key) {
                return Ok((value, DataOrigin::Cache));
            }
        }
        let payload = self.fetch_accept(url, "application/json").await?;
        let value = decode::json::parse(&payload.bytes)?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(cache_key, value.clone()) {
                warn!(cache_key, "cache write failed: {e}");
            }
        }
        Ok((value, DataOrigin::Live))
    }
}

/// What a successful driver run produced.
#[derive(Debug)]
pub struct DriverReport {
    /// Canonical records, one provenance entry each.
    pub records: Vec<Organisation>,
    /// Per-source metadata; `duration_ms` is filled in by the orchestrator.
    pub metadata: SourceMetadata,
    /// Sub-pipeline failures that did not sink the driver.
    pub partial_warnings: Vec<Error>,
}

impl DriverReport {
    /// Report for `records` fetched from `url`.
    #[must_use]
    pub fn new(source: SourceId, url: Option<&str>, records: Vec<Organisation>) -> Self {
        Self {
            metadata: SourceMetadata {
                source,
                url: url.map(ToString::to_string),
                retrieved_at: Utc::now(),
                record_count: records.len(),
                duration_ms: 0,
            },
            records,
            partial_warnings: Vec::new(),
        }
    }

    /// Attach sub-pipeline warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<Error>) -> Self {
        self.partial_warnings = warnings;
        self
    }
}

/// A source driver: fetch, parse, and map one external source.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Registered identity of this driver's source.
    fn id(&self) -> SourceId;

    /// `--source` values that select this driver, compared case-insensitively.
    fn filter_aliases(&self) -> &'static [&'static str];

    /// One-line description for the `sources` listing.
    fn description(&self) -> &'static str;

    /// Run the full fetch → parse → map pipeline.
    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport>;
}

/// Provenance entry for records emitted by `source` in this run.
#[must_use]
pub fn source_ref(source: SourceId, url: Option<&str>, confidence: f64) -> DataSourceReference {
    DataSourceReference {
        source,
        retrieved_at: Utc::now(),
        source_url: url.map(ToString::to_string),
        confidence,
    }
}

/// Minimal canonical record; drivers fill in whatever else the source exposes.
#[must_use]
pub fn base_record(
    id: String,
    name: String,
    org_type: crate::model::OrganisationType,
    provenance: DataSourceReference,
) -> Organisation {
    Organisation {
        id,
        name,
        alternative_names: Vec::new(),
        org_type,
        classification: None,
        status: Status::Active,
        parent_organisation: None,
        controlling_unit: None,
        location: None,
        establishment_date: None,
        dissolution_date: None,
        website: None,
        sources: vec![provenance],
        additional_properties: std::collections::BTreeMap::new(),
        data_quality: None,
        last_updated: Utc::now(),
    }
}

/// Deterministic record id: `<prefix><slug-of-name>`.
///
/// The slug lowercases, maps punctuation runs to single hyphens, and trims.
/// Names that slug to nothing fall back to a short content hash so the id is
/// still stable and non-empty.
#[must_use]
pub fn slug_id(prefix: &str, name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(name.as_bytes());
        return format!("{prefix}{:x}", u64::from_be_bytes(digest[..8].try_into().unwrap_or([0; 8])));
    }
    format!("{prefix}{slug}")
}

/// Fail the driver when its record count falls below the sanity floor.
pub fn enforce_floor(records: &[Organisation], floor: usize) -> Result<()> {
    if records.len() < floor {
        return Err(Error::RecordCountBelowFloor {
            expected: floor,
            got: records.len(),
        });
    }
    Ok(())
}

/// Validate mapped records, dropping violators with a warning.
///
/// Per-record validation failures never fail a driver; the record is dropped
/// and the rejection logged.
#[must_use]
pub fn retain_valid(records: Vec<Organisation>, source: SourceId) -> Vec<Organisation> {
    records
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(source = %source, id = %record.id, "dropping invalid record: {e}");
                false
            }
        })
        .collect()
}

/// Shared per-request default used when a caller does not override timeout.
#[must_use]
pub fn default_fetch_options(timeout: Option<Duration>) -> FetchOptions {
    timeout.map_or_else(FetchOptions::default, FetchOptions::with_timeout)
}
