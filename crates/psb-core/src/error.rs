//! Error types and handling for psb-core operations.
//!
//! Every failure the aggregation engine can produce is represented here, from
//! transport problems during fetch through decode failures to the per-source
//! sanity checks. Errors carry enough context for the orchestrator to decide
//! whether a driver failed outright or merely lost one sub-pipeline, and for
//! the HTTP capability to decide whether a retry is worthwhile.

use thiserror::Error;

/// The main error type for psb-core operations.
///
/// All public functions in psb-core return `Result<T, Error>`. Variants map
/// one-to-one onto the failure taxonomy the orchestrator reports on: network
/// failures are retryable, structural failures are fatal to the driver that
/// observed them, and validation failures drop a single record.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed (cache reads/writes, artifact output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request exceeded its configured timeout.
    ///
    /// Retried by the HTTP capability; surfaces to the driver only once the
    /// retry budget is exhausted.
    #[error("Timeout fetching {url}")]
    Timeout {
        /// URL of the request that timed out.
        url: String,
    },

    /// Network-level failure (DNS, connect, TLS, interrupted body).
    ///
    /// Retried by the HTTP capability, then fatal to the driver.
    #[error("Transport error fetching {url}: {detail}")]
    Transport {
        /// URL of the failed request.
        url: String,
        /// Underlying failure description.
        detail: String,
    },

    /// Non-2xx HTTP response.
    ///
    /// 5xx and 429 are retried; any other 4xx is fatal to the driver.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned by the server.
        status: u16,
        /// URL of the request.
        url: String,
    },

    /// Response body exceeded the configured size limit.
    #[error("Response from {url} exceeded {limit} bytes")]
    SizeExceeded {
        /// URL of the request.
        url: String,
        /// Configured maximum body size.
        limit: usize,
    },

    /// A payload could not be decoded in the expected format.
    ///
    /// Fatal to the driver that requested the decode.
    #[error("Decode error ({format}): {detail}")]
    Decode {
        /// Payload format ("json", "csv", "xlsx", "html", "pdf").
        format: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// An expected DOM container, workbook sheet, or column is missing.
    ///
    /// Raised when a scraped page or downloaded file no longer matches the
    /// shape the driver was written against. Always fatal — a silent
    /// zero-row result is never acceptable.
    #[error("Source structure changed for {source_id}: {detail}")]
    StructureChanged {
        /// Identifier of the source whose shape changed.
        source_id: String,
        /// Which structural expectation failed.
        detail: String,
    },

    /// A driver produced fewer records than its sanity floor.
    #[error("Record count below floor: expected at least {expected}, got {got}")]
    RecordCountBelowFloor {
        /// Minimum record count for this source.
        expected: usize,
        /// Count actually produced.
        got: usize,
    },

    /// Parsed college count differs from the count the page reported.
    #[error("Count mismatch for {region}: page says {expected}, PDF parsed {got}")]
    CountMismatch {
        /// Region whose counts disagree.
        region: String,
        /// Count advertised on the aggregator page.
        expected: usize,
        /// Count recovered from the PDF.
        got: usize,
    },

    /// A dynamically discovered download link could not be found.
    #[error("Link discovery failed for {source_id}: {detail}")]
    LinkDiscovery {
        /// Identifier of the source whose link resolution failed.
        source_id: String,
        /// What was searched for.
        detail: String,
    },

    /// Cancellation was requested while the operation was in flight.
    ///
    /// Never retried; drivers stop at the next check point and return this.
    #[error("Operation cancelled")]
    Cancelled,

    /// A mapped record violates a canonical-model invariant.
    ///
    /// The offending record is dropped and the violation reported as a
    /// warning; the driver keeps running.
    #[error("Validation failed for field '{field}': {rule}")]
    Validation {
        /// Field that failed validation.
        field: &'static str,
        /// Invariant that was violated.
        rule: String,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Only transport-level failures qualify: timeouts, network errors, and
    /// the retryable status codes (5xx, 429). Everything else is a permanent
    /// property of the payload or the source and retrying cannot help.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used for structured log fields and for grouping failures in the
    /// end-of-run summary.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::Decode { .. } => "decode",
            Self::StructureChanged { .. } => "structure_changed",
            Self::RecordCountBelowFloor { .. } => "record_count_below_floor",
            Self::CountMismatch { .. } => "count_mismatch",
            Self::LinkDiscovery { .. } => "link_discovery",
            Self::Cancelled => "cancelled",
            Self::Validation { .. } => "validation",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_are_transport_level() {
        let recoverable = vec![
            Error::Timeout {
                url: "https://example.com".into(),
            },
            Error::Transport {
                url: "https://example.com".into(),
                detail: "connection reset".into(),
            },
            Error::HttpStatus {
                status: 503,
                url: "https://example.com".into(),
            },
            Error::HttpStatus {
                status: 429,
                url: "https://example.com".into(),
            },
        ];
        for err in recoverable {
            assert!(err.is_recoverable(), "expected {err:?} to be recoverable");
        }
    }

    #[test]
    fn permanent_errors_are_not_recoverable() {
        let permanent = vec![
            Error::HttpStatus {
                status: 404,
                url: "https://example.com".into(),
            },
            Error::Decode {
                format: "json",
                detail: "unexpected EOF".into(),
            },
            Error::StructureChanged {
                source_id: "defra_uk_air".into(),
                detail: "missing #container".into(),
            },
            Error::RecordCountBelowFloor {
                expected: 45,
                got: 3,
            },
            Error::Cancelled,
            Error::Validation {
                field: "name",
                rule: "must not be empty".into(),
            },
        ];
        for err in permanent {
            assert!(!err.is_recoverable(), "expected {err:?} to be permanent");
        }
    }

    #[test]
    fn categories_are_stable() {
        assert_eq!(
            Error::Timeout {
                url: String::new()
            }
            .category(),
            "timeout"
        );
        assert_eq!(
            Error::CountMismatch {
                region: "Scotland".into(),
                expected: 24,
                got: 25,
            }
            .category(),
            "count_mismatch"
        );
        assert_eq!(Error::Cancelled.category(), "cancelled");
    }

    #[test]
    fn display_includes_context() {
        let err = Error::CountMismatch {
            region: "Scotland".into(),
            expected: 24,
            got: 25,
        };
        let text = err.to_string();
        assert!(text.contains("Scotland"));
        assert!(text.contains("24"));
        assert!(text.contains("25"));

        let err = Error::HttpStatus {
            status: 502,
            url: "https://www.gov.uk/api".into(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("gov.uk"));
    }
}
