//! Northern Ireland drivers: Executive departments, health and social care
//! trusts, and port authorities.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const DEPARTMENTS: HtmlListSource = HtmlListSource {
    source: SourceId::NiGovernment,
    url: "https://www.northernireland.gov.uk/topics/government-departments",
    item_selector: "article ul li a, .page-content ul li a",
    floor: 9,
    id_prefix: "ni-dept-",
    org_type: OrganisationType::MinisterialDepartment,
    classification: Some("Northern Ireland Executive department"),
    country: Some("Northern Ireland"),
    confidence: 0.9,
};

/// Driver for the Northern Ireland Executive department listing.
pub struct NiGovernmentDriver;

#[async_trait]
impl Driver for NiGovernmentDriver {
    fn id(&self) -> SourceId {
        SourceId::NiGovernment
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ni_government", "ni-departments"]
    }

    fn description(&self) -> &'static str {
        "Northern Ireland Executive departments"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        DEPARTMENTS.run(ctx).await
    }
}

const HEALTH_TRUSTS: HtmlListSource = HtmlListSource {
    source: SourceId::NiHealth,
    url: "https://online.hscni.net/our-services/health-and-social-care-trusts/",
    item_selector: "article ul li a, .entry-content ul li a",
    floor: 5,
    id_prefix: "NIHT_",
    org_type: OrganisationType::NhsTrust,
    classification: Some("Health and social care trust"),
    country: Some("Northern Ireland"),
    confidence: 0.9,
};

/// Driver for the NI health and social care trust listing.
pub struct NiHealthDriver;

#[async_trait]
impl Driver for NiHealthDriver {
    fn id(&self) -> SourceId {
        SourceId::NiHealth
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ni_health", "hsc-trusts"]
    }

    fn description(&self) -> &'static str {
        "NI health and social care trusts"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        HEALTH_TRUSTS.run(ctx).await
    }
}

const PORTS: HtmlListSource = HtmlListSource {
    source: SourceId::InfrastructureNiPorts,
    url: "https://www.infrastructure-ni.gov.uk/articles/gateways-ports",
    item_selector: "article ul li a, .page-content ul li",
    floor: 4,
    id_prefix: "ni-port-",
    org_type: OrganisationType::PublicCorporation,
    classification: Some("Port authority"),
    country: Some("Northern Ireland"),
    confidence: 0.8,
};

/// Driver for the NI port authority listing.
pub struct InfrastructureNiPortsDriver;

#[async_trait]
impl Driver for InfrastructureNiPortsDriver {
    fn id(&self) -> SourceId {
        SourceId::InfrastructureNiPorts
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["infrastructure_ni_ports", "ni-ports"]
    }

    fn description(&self) -> &'static str {
        "NI port authorities"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        PORTS.run(ctx).await
    }
}
