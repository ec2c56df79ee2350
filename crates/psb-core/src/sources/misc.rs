//! Remaining scraped-list drivers: DEFRA UK-AIR, Groundwork, National Parks,
//! and UKRI.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const DEFRA: HtmlListSource = HtmlListSource {
    source: SourceId::DefraUkAir,
    url: "https://uk-air.defra.gov.uk/links?view=la",
    item_selector: ".bodytext ul li a, #content ul li a",
    floor: 300,
    id_prefix: "la-",
    org_type: OrganisationType::LocalAuthority,
    classification: Some("Local authority"),
    country: None,
    confidence: 0.8,
};

/// Driver for the DEFRA UK-AIR local authority listing.
pub struct DefraUkAirDriver;

#[async_trait]
impl Driver for DefraUkAirDriver {
    fn id(&self) -> SourceId {
        SourceId::DefraUkAir
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["defra_uk_air", "defra", "local-authorities"]
    }

    fn description(&self) -> &'static str {
        "DEFRA UK-AIR local authority directory"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        DEFRA.run(ctx).await
    }
}

const GROUNDWORK: HtmlListSource = HtmlListSource {
    source: SourceId::Groundwork,
    url: "https://www.groundwork.org.uk/find-groundwork-near-me/",
    item_selector: ".trust-list li a, .locations li a",
    floor: 10,
    id_prefix: "groundwork-",
    org_type: OrganisationType::Other,
    classification: Some("Groundwork trust"),
    country: None,
    confidence: 0.8,
};

/// Driver for the Groundwork federation trust listing.
pub struct GroundworkDriver;

#[async_trait]
impl Driver for GroundworkDriver {
    fn id(&self) -> SourceId {
        SourceId::Groundwork
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["groundwork"]
    }

    fn description(&self) -> &'static str {
        "Groundwork federation trusts"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        GROUNDWORK.run(ctx).await
    }
}

const PARKS: HtmlListSource = HtmlListSource {
    source: SourceId::NationalparksUk,
    url: "https://www.nationalparks.uk/parks/",
    item_selector: ".parks-grid a .park-name, .park-list li a",
    floor: 13,
    id_prefix: "park-",
    org_type: OrganisationType::NationalPark,
    classification: Some("National park authority"),
    country: None,
    confidence: 0.9,
};

/// Driver for the National Parks UK member listing.
pub struct NationalParksDriver;

#[async_trait]
impl Driver for NationalParksDriver {
    fn id(&self) -> SourceId {
        SourceId::NationalparksUk
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nationalparks_uk", "national-parks"]
    }

    fn description(&self) -> &'static str {
        "UK national park authorities"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        PARKS.run(ctx).await
    }
}

const UKRI: HtmlListSource = HtmlListSource {
    source: SourceId::Ukri,
    url: "https://www.ukri.org/councils/",
    item_selector: ".councils-list li a, .ukri-grid .council-name",
    floor: 9,
    id_prefix: "ukri-",
    org_type: OrganisationType::ResearchCouncil,
    classification: Some("Research council"),
    country: None,
    confidence: 0.9,
};

/// Driver for the UKRI council listing.
pub struct UkriDriver;

#[async_trait]
impl Driver for UkriDriver {
    fn id(&self) -> SourceId {
        SourceId::Ukri
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ukri", "research-councils"]
    }

    fn description(&self) -> &'static str {
        "UKRI research councils"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        UKRI.run(ctx).await
    }
}
