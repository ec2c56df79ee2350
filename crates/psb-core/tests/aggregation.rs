//! End-to-end engine tests over stub drivers: orchestration, partial-failure
//! tolerance, dedup invariants, and artifact output.

use std::sync::Arc;

use async_trait::async_trait;
use psb_core::dedup::merge_key;
use psb_core::driver::{
    Driver, DriverContext, DriverReport, base_record, slug_id, source_ref,
};
use psb_core::orchestrator::{RunConfig, run_drivers};
use psb_core::writer::write_artifact;
use psb_core::{Error, OrganisationType, SourceId, Status};
use tokio_util::sync::CancellationToken;

/// Stub driver yielding `count` well-formed records.
struct StubDriver {
    source: SourceId,
    count: usize,
}

#[async_trait]
impl Driver for StubDriver {
    fn id(&self) -> SourceId {
        self.source
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["stub"]
    }

    fn description(&self) -> &'static str {
        "stub"
    }

    async fn fetch_and_map(&self, _ctx: &DriverContext) -> psb_core::Result<DriverReport> {
        let provenance = source_ref(self.source, None, 1.0);
        let records = (0..self.count)
            .map(|i| {
                base_record(
                    slug_id("stub-", &format!("Stub Body {i}")),
                    format!("Stub Body {i}"),
                    OrganisationType::Other,
                    provenance.clone(),
                )
            })
            .collect();
        Ok(DriverReport::new(self.source, None, records))
    }
}

/// Stub driver that always fails with a transport error.
struct BrokenDriver;

#[async_trait]
impl Driver for BrokenDriver {
    fn id(&self) -> SourceId {
        SourceId::Nfcc
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["broken"]
    }

    fn description(&self) -> &'static str {
        "always fails"
    }

    async fn fetch_and_map(&self, _ctx: &DriverContext) -> psb_core::Result<DriverReport> {
        Err(Error::Transport {
            url: "https://nfcc.org.uk".into(),
            detail: "connection refused".into(),
        })
    }
}

#[tokio::test]
async fn one_failed_source_does_not_sink_the_run() {
    let drivers: Vec<Arc<dyn Driver>> = vec![
        Arc::new(StubDriver {
            source: SourceId::GovUkApi,
            count: 100,
        }),
        Arc::new(BrokenDriver),
    ];

    let result = run_drivers(drivers, &RunConfig::default(), CancellationToken::new())
        .await
        .expect("run should complete");

    assert!(result.success);
    assert_eq!(result.records.len(), 100);
    assert_eq!(result.partial_failures.len(), 1);
    assert_eq!(result.partial_failures[0].source, SourceId::Nfcc);
    assert_eq!(result.partial_failures[0].error.category(), "transport");
    // Only the successful source appears in metadata.
    assert_eq!(result.metadata.sources.len(), 1);
    assert_eq!(result.metadata.sources[0].source, SourceId::GovUkApi);
}

#[tokio::test]
async fn all_sources_failing_yields_an_unsuccessful_result() {
    let drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(BrokenDriver)];
    let result = run_drivers(drivers, &RunConfig::default(), CancellationToken::new())
        .await
        .expect("run should complete");
    assert!(!result.success);
    assert!(result.records.is_empty());
    assert_eq!(result.partial_failures.len(), 1);
}

#[tokio::test]
async fn overlapping_sources_are_merged_and_invariants_hold() {
    // Two drivers emit overlapping record sets; the overlap must collapse.
    let drivers: Vec<Arc<dyn Driver>> = vec![
        Arc::new(StubDriver {
            source: SourceId::GovUkApi,
            count: 20,
        }),
        Arc::new(StubDriver {
            source: SourceId::OnsInstitutional,
            count: 10,
        }),
    ];

    let result = run_drivers(drivers, &RunConfig::default(), CancellationToken::new())
        .await
        .expect("run should complete");

    assert_eq!(result.records.len(), 20);
    assert_eq!(result.metadata.statistics.duplicates_found, 10);

    for record in &result.records {
        // Universal invariants.
        assert!(!record.sources.is_empty());
        assert!(!record.name.trim().is_empty());
        assert!(matches!(
            record.status,
            Status::Active | Status::Inactive | Status::Dissolved
        ));
        if let (Some(established), Some(dissolved)) =
            (record.establishment_date, record.dissolution_date)
        {
            assert!(dissolved >= established);
        }
    }

    // No two outputs share a merge key.
    let mut keys: Vec<_> = result.records.iter().map(merge_key).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);

    // Records overlapping across sources carry both provenance entries.
    let merged = result
        .records
        .iter()
        .find(|r| r.sources.len() == 2)
        .expect("overlapping records keep both sources");
    let provenance: Vec<_> = merged.sources.iter().map(|s| s.source).collect();
    assert_eq!(
        provenance,
        vec![SourceId::GovUkApi, SourceId::OnsInstitutional]
    );
}

#[tokio::test]
async fn artifact_round_trips_from_a_full_run() {
    let drivers: Vec<Arc<dyn Driver>> = vec![Arc::new(StubDriver {
        source: SourceId::GovUkApi,
        count: 5,
    })];
    let result = run_drivers(drivers, &RunConfig::default(), CancellationToken::new())
        .await
        .expect("run should complete");

    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("dist").join("orgs.json");
    write_artifact(&path, result.records, result.metadata, true).expect("write");

    let raw = std::fs::read_to_string(&path).expect("read artifact");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(value["organisations"].as_array().map(Vec::len), Some(5));
    assert!(value["metadata"]["processedAt"].is_string());
    assert!(value["metadata"]["statistics"]["totalOrganisations"].is_number());
    // Optional fields are omitted, not null.
    let first = &value["organisations"][0];
    assert!(first.get("website").is_none());
    assert!(first.get("dissolutionDate").is_none());
}

/// Stub driver that blocks until cancellation, like a hung fetch.
struct HangingDriver;

#[async_trait]
impl Driver for HangingDriver {
    fn id(&self) -> SourceId {
        SourceId::Gias
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["hanging"]
    }

    fn description(&self) -> &'static str {
        "blocks until cancelled"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> psb_core::Result<DriverReport> {
        ctx.cancel.cancelled().await;
        Err(Error::Cancelled)
    }
}

#[tokio::test]
async fn cancellation_yields_a_partial_result() {
    let drivers: Vec<Arc<dyn Driver>> = vec![
        Arc::new(StubDriver {
            source: SourceId::GovUkApi,
            count: 8,
        }),
        Arc::new(HangingDriver),
    ];

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = run_drivers(drivers, &RunConfig::default(), cancel)
        .await
        .expect("run should complete");

    // The fast source's records survive; the hung one reports Cancelled.
    assert!(result.success);
    assert_eq!(result.records.len(), 8);
    assert_eq!(result.partial_failures.len(), 1);
    assert_eq!(result.partial_failures[0].error.category(), "cancelled");
}

#[tokio::test]
async fn identical_inputs_produce_identical_record_sets() {
    // Determinism: same snapshot, same output order and ids.
    let make = || -> Vec<Arc<dyn Driver>> {
        vec![
            Arc::new(StubDriver {
                source: SourceId::GovUkApi,
                count: 12,
            }),
            Arc::new(StubDriver {
                source: SourceId::MygovScot,
                count: 7,
            }),
        ]
    };
    let a = run_drivers(make(), &RunConfig::default(), CancellationToken::new())
        .await
        .expect("first run");
    let b = run_drivers(make(), &RunConfig::default(), CancellationToken::new())
        .await
        .expect("second run");

    let ids_a: Vec<_> = a.records.iter().map(|r| r.id.clone()).collect();
    let ids_b: Vec<_> = b.records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids_a, ids_b);
}
