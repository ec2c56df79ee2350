//! Statically curated devolved administration records.
//!
//! Three records that no public endpoint lists cleanly, embedded at compile
//! time and flagged as fallback data. The driver still runs the full
//! contract: deterministic ids, one provenance entry each, a floor.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport, base_record, enforce_floor, slug_id, source_ref};
use crate::model::{
    DataOrigin, DataQuality, Location, OrganisationType, SourceId,
};
use crate::Result;

struct Administration {
    name: &'static str,
    alternative: &'static str,
    country: &'static str,
    website: &'static str,
}

const ADMINISTRATIONS: &[Administration] = &[
    Administration {
        name: "Scottish Government",
        alternative: "Riaghaltas na h-Alba",
        country: "Scotland",
        website: "https://www.gov.scot",
    },
    Administration {
        name: "Welsh Government",
        alternative: "Llywodraeth Cymru",
        country: "Wales",
        website: "https://www.gov.wales",
    },
    Administration {
        name: "Northern Ireland Executive",
        alternative: "The Executive Office",
        country: "Northern Ireland",
        website: "https://www.northernireland.gov.uk",
    },
];

/// Driver for the curated devolved administration records.
pub struct DevolvedAdminDriver;

#[async_trait]
impl Driver for DevolvedAdminDriver {
    fn id(&self) -> SourceId {
        SourceId::DevolvedAdminStatic
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["devolved_admin_static", "devolved"]
    }

    fn description(&self) -> &'static str {
        "Curated devolved administration records"
    }

    async fn fetch_and_map(&self, _ctx: &DriverContext) -> Result<DriverReport> {
        let provenance = source_ref(self.id(), None, 1.0);
        let records: Vec<_> = ADMINISTRATIONS
            .iter()
            .map(|admin| {
                let mut record = base_record(
                    slug_id("devolved-", admin.name),
                    admin.name.to_string(),
                    OrganisationType::DevolvedAdministration,
                    provenance.clone(),
                );
                record.alternative_names.push(admin.alternative.to_string());
                record.website = Some(admin.website.to_string());
                record.location = Some(Location {
                    country: Some(admin.country.to_string()),
                    ..Location::default()
                });
                record.data_quality = Some(DataQuality {
                    completeness: record.completeness(),
                    source: DataOrigin::Fallback,
                });
                record
            })
            .collect();

        enforce_floor(&records, ADMINISTRATIONS.len())?;
        Ok(DriverReport::new(self.id(), None, records))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::FetchCache;
    use crate::driver::default_fetch_options;
    use crate::fetch::HttpClient;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn offline_ctx() -> DriverContext {
        DriverContext {
            http: Arc::new(HttpClient::new().unwrap()),
            cache: None::<FetchCache>,
            fetch_options: default_fetch_options(None),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn emits_all_three_administrations() {
        let report = DevolvedAdminDriver.fetch_and_map(&offline_ctx()).await.unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.metadata.record_count, 3);
        for record in &report.records {
            assert_eq!(record.org_type, OrganisationType::DevolvedAdministration);
            assert_eq!(
                record.data_quality.as_ref().map(|q| q.source),
                Some(DataOrigin::Fallback)
            );
            assert_eq!(record.sources.len(), 1);
        }
    }

    #[tokio::test]
    async fn ids_are_stable_across_runs() {
        let a = DevolvedAdminDriver.fetch_and_map(&offline_ctx()).await.unwrap();
        let b = DevolvedAdminDriver.fetch_and_map(&offline_ctx()).await.unwrap();
        let ids_a: Vec<_> = a.records.iter().map(|r| r.id.clone()).collect();
        let ids_b: Vec<_> = b.records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(ids_a[0], "devolved-scottish-government");
    }
}
