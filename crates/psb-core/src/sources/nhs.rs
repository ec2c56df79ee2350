//! NHS England drivers: providers, charities, integrated care boards, and
//! the Healthwatch network.

use async_trait::async_trait;

use crate::decode::html;
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const PROVIDER_URL: &str = "https://www.england.nhs.uk/publication/nhs-provider-directory/";
const PROVIDER_FLOOR: usize = 200;

/// Driver for the NHS provider directory.
///
/// The directory lists every trust as a link; foundation trusts are
/// distinguished by name, which decides the structural type per record.
pub struct NhsProviderDirectoryDriver;

#[async_trait]
impl Driver for NhsProviderDirectoryDriver {
    fn id(&self) -> SourceId {
        SourceId::NhsProviderDirectory
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nhs_provider_directory", "nhs", "nhs-providers"]
    }

    fn description(&self) -> &'static str {
        "NHS provider directory of trusts"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let (text, _) = ctx
            .fetch_text_cached(self.id().as_str(), PROVIDER_URL)
            .await?;
        ctx.check_cancelled()?;

        let names = {
            let doc = html::parse(&text);
            html::require_texts(&doc, "article ul li a, .entry-content ul li a", self.id().as_str())?
        };

        let provenance = source_ref(self.id(), Some(PROVIDER_URL), 1.0);
        let mut seen = std::collections::HashSet::new();
        let mut records = Vec::new();
        for name in names {
            let org_type = if name.to_lowercase().contains("foundation trust") {
                OrganisationType::NhsFoundationTrust
            } else {
                OrganisationType::NhsTrust
            };
            let id = slug_id("nhs-", &name);
            if !seen.insert(id.clone()) {
                continue;
            }
            records.push(base_record(id, name, org_type, provenance.clone()));
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, PROVIDER_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(PROVIDER_URL), records))
    }
}

const CHARITIES: HtmlListSource = HtmlListSource {
    source: SourceId::NhsCharities,
    url: "https://nhscharitiestogether.co.uk/about-us/our-members/",
    item_selector: ".members-list li, .member-grid .member-name",
    floor: 100,
    id_prefix: "nhs-charity-",
    org_type: OrganisationType::Other,
    classification: Some("NHS charity"),
    country: None,
    confidence: 0.8,
};

/// Driver for the NHS charities membership list.
pub struct NhsCharitiesDriver;

#[async_trait]
impl Driver for NhsCharitiesDriver {
    fn id(&self) -> SourceId {
        SourceId::NhsCharities
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nhs_charities", "nhs-charities"]
    }

    fn description(&self) -> &'static str {
        "NHS Charities Together membership"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        CHARITIES.run(ctx).await
    }
}

const ICBS: HtmlListSource = HtmlListSource {
    source: SourceId::NhsIcbs,
    url: "https://www.england.nhs.uk/integratedcare/integrated-care-in-your-area/",
    item_selector: "article ul li a, .entry-content ul li a",
    floor: 40,
    id_prefix: "icb-",
    org_type: OrganisationType::HealthBoard,
    classification: Some("Integrated care board"),
    country: Some("England"),
    confidence: 0.9,
};

/// Driver for the NHS integrated care board listing.
pub struct NhsIcbsDriver;

#[async_trait]
impl Driver for NhsIcbsDriver {
    fn id(&self) -> SourceId {
        SourceId::NhsIcbs
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nhs_icbs", "icbs"]
    }

    fn description(&self) -> &'static str {
        "NHS integrated care boards"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        ICBS.run(ctx).await
    }
}

const HEALTHWATCH: HtmlListSource = HtmlListSource {
    source: SourceId::Healthwatch,
    url: "https://www.healthwatch.co.uk/your-local-healthwatch/list",
    item_selector: ".view-content .views-row a, .local-healthwatch-list li a",
    floor: 100,
    id_prefix: "healthwatch-",
    org_type: OrganisationType::Other,
    classification: Some("Local Healthwatch"),
    country: Some("England"),
    confidence: 0.8,
};

/// Driver for the local Healthwatch network directory.
pub struct HealthwatchDriver;

#[async_trait]
impl Driver for HealthwatchDriver {
    fn id(&self) -> SourceId {
        SourceId::Healthwatch
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["healthwatch"]
    }

    fn description(&self) -> &'static str {
        "Local Healthwatch directory"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        HEALTHWATCH.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn foundation_trusts_are_distinguished_by_name() {
        let is_foundation =
            |name: &str| name.to_lowercase().contains("foundation trust");
        assert!(is_foundation("Leeds Teaching Hospitals NHS Foundation Trust"));
        assert!(!is_foundation("East of England Ambulance Service NHS Trust"));
    }
}
