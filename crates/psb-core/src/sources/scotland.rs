//! Scottish public body drivers.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const MYGOV: HtmlListSource = HtmlListSource {
    source: SourceId::MygovScot,
    url: "https://www.mygov.scot/organisations",
    item_selector: ".organisations-list li a, .ds_search-results li a",
    floor: 80,
    id_prefix: "scot-",
    org_type: OrganisationType::Other,
    classification: Some("Scottish public body"),
    country: Some("Scotland"),
    confidence: 0.9,
};

/// Driver for the mygov.scot organisation listing.
pub struct MygovScotDriver;

#[async_trait]
impl Driver for MygovScotDriver {
    fn id(&self) -> SourceId {
        SourceId::MygovScot
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["mygov_scot", "mygov", "scottish-bodies"]
    }

    fn description(&self) -> &'static str {
        "mygov.scot public body listing"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        MYGOV.run(ctx).await
    }
}

const BOARDS: HtmlListSource = HtmlListSource {
    source: SourceId::NhsScotlandBoards,
    url: "https://www.scot.nhs.uk/organisations/",
    item_selector: ".boards-list li a, article ul li a",
    floor: 14,
    id_prefix: "nhs-scot-",
    org_type: OrganisationType::HealthBoard,
    classification: Some("NHS Scotland health board"),
    country: Some("Scotland"),
    confidence: 0.9,
};

/// Driver for the NHS Scotland health board listing.
///
/// Fourteen territorial boards plus the national specials; the floor covers
/// the territorial set.
pub struct NhsScotlandBoardsDriver;

#[async_trait]
impl Driver for NhsScotlandBoardsDriver {
    fn id(&self) -> SourceId {
        SourceId::NhsScotlandBoards
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nhs_scotland_boards", "nhs-scotland"]
    }

    fn description(&self) -> &'static str {
        "NHS Scotland health boards"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        BOARDS.run(ctx).await
    }
}

const RTPS: HtmlListSource = HtmlListSource {
    source: SourceId::TransportScotlandRtps,
    url: "https://www.transport.gov.scot/our-approach/strategy/regional-transport-partnerships/",
    item_selector: "article ul li a, .rtp-list li",
    floor: 7,
    id_prefix: "rtp-",
    org_type: OrganisationType::TransportPartnership,
    classification: Some("Regional transport partnership"),
    country: Some("Scotland"),
    confidence: 0.9,
};

/// Driver for Transport Scotland's regional transport partnerships.
pub struct TransportScotlandRtpsDriver;

#[async_trait]
impl Driver for TransportScotlandRtpsDriver {
    fn id(&self) -> SourceId {
        SourceId::TransportScotlandRtps
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["transport_scotland_rtps", "rtps"]
    }

    fn description(&self) -> &'static str {
        "Regional transport partnerships"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        RTPS.run(ctx).await
    }
}
