//! Pipeline orchestration: select drivers, run them concurrently, collect
//! results, deduplicate, and assemble run metadata.
//!
//! Drivers are independent and side-effect-isolated, so they run under a
//! bounded worker pool. Completion order is whatever the network gives us;
//! results are collected back into registry order so every downstream step
//! (dedup input, metadata, the artifact itself) is deterministic for a given
//! set of source snapshots.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::FetchCache;
use crate::dedup::deduplicate;
use crate::driver::{DriverContext, default_fetch_options};
use crate::fetch::HttpClient;
use crate::model::{Organisation, ProcessingMetadata, SourceId, Statistics};
use crate::registry::select;
use crate::{Error, Result};

/// Run configuration, assembled once by the caller and shared immutably.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// `--source` filter; `None` runs every driver.
    pub source_filter: Option<String>,
    /// Enable the on-disk fetch cache.
    pub cache_enabled: bool,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
    /// Worker bound; `None` uses the machine's parallelism.
    pub concurrency: Option<usize>,
}

/// One driver's failure, kept for the end-of-run summary.
#[derive(Debug)]
pub struct SourceFailure {
    /// Which source failed.
    pub source: SourceId,
    /// Why.
    pub error: Error,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct AggregationResult {
    /// True when at least one source yielded records.
    pub success: bool,
    /// Deduplicated records, sorted by id.
    pub records: Vec<Organisation>,
    /// Run metadata for the artifact.
    pub metadata: ProcessingMetadata,
    /// Failures that did not abort the run.
    pub partial_failures: Vec<SourceFailure>,
    /// Sub-pipeline warnings from drivers that still succeeded.
    pub partial_warnings: Vec<SourceFailure>,
}

/// Run the aggregation end to end.
///
/// # Errors
///
/// Fails only on setup problems (no driver matches the filter, HTTP client
/// construction). Driver failures are collected, never propagated.
pub async fn run(config: &RunConfig, cancel: CancellationToken) -> Result<AggregationResult> {
    let drivers = select(config.source_filter.as_deref());
    if drivers.is_empty() {
        return Err(Error::Validation {
            field: "source",
            rule: format!(
                "no driver matches filter '{}'",
                config.source_filter.as_deref().unwrap_or_default()
            ),
        });
    }
    run_drivers(drivers, config, cancel).await
}

/// Run a caller-supplied driver set. [`run`] resolves the filter and
/// delegates here; tests inject stub drivers the same way.
///
/// # Errors
///
/// Fails only when the HTTP client cannot be constructed.
pub async fn run_drivers(
    drivers: Vec<Arc<dyn crate::driver::Driver>>,
    config: &RunConfig,
    cancel: CancellationToken,
) -> Result<AggregationResult> {
    let ctx = DriverContext {
        http: Arc::new(HttpClient::with_timeout(
            config.timeout.unwrap_or(crate::fetch::DEFAULT_TIMEOUT),
        )?),
        cache: config.cache_enabled.then(FetchCache::default_location),
        fetch_options: default_fetch_options(config.timeout),
        cancel,
    };

    let worker_bound = config
        .concurrency
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, |n| n.get()))
        .max(1);
    info!(
        drivers = drivers.len(),
        workers = worker_bound,
        "starting aggregation"
    );

    let semaphore = Arc::new(Semaphore::new(worker_bound));
    let mut handles = Vec::with_capacity(drivers.len());
    for driver in drivers {
        let semaphore = Arc::clone(&semaphore);
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            // Closed semaphore means shutdown; surface it as cancellation.
            let Ok(_permit) = semaphore.acquire().await else {
                return (driver.id(), Err(Error::Cancelled));
            };
            let started = std::time::Instant::now();
            let outcome = driver.fetch_and_map(&ctx).await.map(|mut report| {
                report.metadata.duration_ms = started.elapsed().as_millis() as u64;
                report
            });
            (driver.id(), outcome)
        }));
    }

    // Join in spawn (registry) order: completion order is nondeterministic
    // but the collected results are not.
    let mut all_records = Vec::new();
    let mut source_metadata = Vec::new();
    let mut partial_failures = Vec::new();
    let mut partial_warnings = Vec::new();
    for handle in handles {
        let (source, outcome) = match handle.await {
            Ok(pair) => pair,
            Err(join_error) => {
                error!("driver task panicked: {join_error}");
                continue;
            }
        };
        match outcome {
            Ok(report) => {
                info!(
                    source = %source,
                    records = report.records.len(),
                    duration_ms = report.metadata.duration_ms,
                    "source complete"
                );
                for warning in report.partial_warnings {
                    warn!(source = %source, "partial: {warning}");
                    partial_warnings.push(SourceFailure {
                        source,
                        error: warning,
                    });
                }
                source_metadata.push(report.metadata);
                all_records.extend(report.records);
            }
            Err(error) => {
                warn!(source = %source, category = error.category(), "source failed: {error}");
                partial_failures.push(SourceFailure { source, error });
            }
        }
    }

    log_memory_checkpoint("post-fetch");
    let outcome = deduplicate(all_records);
    log_memory_checkpoint("post-dedup");
    info!(
        original = outcome.original_count,
        merged = outcome.deduplicated_count,
        duplicates = outcome.duplicates_found,
        conflicts = outcome.conflicts_detected,
        "dedup complete"
    );

    let mut organisations_by_type = std::collections::BTreeMap::new();
    for record in &outcome.organisations {
        *organisations_by_type
            .entry(record.org_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    let metadata = ProcessingMetadata {
        processed_at: Utc::now(),
        sources: source_metadata,
        statistics: Statistics {
            total_organisations: outcome.deduplicated_count,
            duplicates_found: outcome.duplicates_found,
            conflicts_detected: outcome.conflicts_detected,
            organisations_by_type,
        },
    };

    Ok(AggregationResult {
        success: !outcome.organisations.is_empty(),
        records: outcome.organisations,
        metadata,
        partial_failures,
        partial_warnings,
    })
}

/// Record peak RSS at a pipeline checkpoint, for diagnosing memory growth on
/// the large tabular sources.
fn log_memory_checkpoint(stage: &str) {
    let mut system = sysinfo::System::new();
    let pid = sysinfo::get_current_pid().ok();
    if let Some(pid) = pid {
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
        if let Some(process) = system.process(pid) {
            info!(
                stage,
                rss_mb = process.memory() / (1024 * 1024),
                "memory checkpoint"
            );
        }
    }
}
