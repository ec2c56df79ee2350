//! # psb-core
//!
//! Aggregation engine for the UK public sector body dataset.
//!
//! The engine pulls authoritative organisation records from several dozen
//! heterogeneous public sources (JSON APIs, scraped directories, CSV and
//! Excel downloads, PDF membership lists), normalises them into one
//! canonical record type, merges records that describe the same real-world
//! body, and writes a single deduplicated JSON artifact.
//!
//! ## Architecture
//!
//! - **Model**: the canonical [`model::Organisation`] record, its enums, and
//!   the pure classification/status/date helpers.
//! - **Capabilities**: [`fetch::HttpClient`] (retrying, cancellable GET),
//!   the [`cache::FetchCache`] wrapper, and the [`decode`] modules for JSON,
//!   CSV, Excel, HTML, and PDF payloads.
//! - **Drivers**: one [`driver::Driver`] per source under [`sources`],
//!   selected through [`registry`].
//! - **Engine**: [`orchestrator::run`] fans drivers out under a bounded
//!   worker pool, [`dedup::deduplicate`] merges the union, and
//!   [`writer::write_artifact`] publishes the result.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use psb_core::orchestrator::{self, RunConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> psb_core::Result<()> {
//! let config = RunConfig::default();
//! let result = orchestrator::run(&config, CancellationToken::new()).await?;
//! println!("aggregated {} organisations", result.records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! Driver failures are partial: a dead source is reported in
//! [`orchestrator::AggregationResult::partial_failures`] while every other
//! source still contributes. The run as a whole fails only when no source
//! yields records. See [`Error`] for the taxonomy.

/// On-disk fetch cache with a freshness window
pub mod cache;
/// Payload decoders (JSON, CSV, Excel, HTML, PDF)
pub mod decode;
/// Deduplication and conflict resolution
pub mod dedup;
/// The uniform source driver contract
pub mod driver;
/// Error types and result alias
pub mod error;
/// HTTP capability with retry and cancellation
pub mod fetch;
/// Canonical data model
pub mod model;
/// Pipeline orchestration
pub mod orchestrator;
/// Driver registry and filter selection
pub mod registry;
/// Per-source driver implementations
pub mod sources;
/// Artifact writer
pub mod writer;

pub use error::{Error, Result};
pub use model::{
    DataOrigin, DataQuality, DataSourceReference, Location, Organisation, OrganisationType,
    ProcessingMetadata, SourceId, SourceMetadata, Statistics, Status,
};
pub use orchestrator::{AggregationResult, RunConfig, SourceFailure};
