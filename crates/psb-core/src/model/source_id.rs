//! The closed registry of data source identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a registered data source.
///
/// This is a closed set: every provenance entry, every per-source metadata
/// row, and every `--source` filter resolves to one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// gov.uk content API organisation listing.
    GovUkApi,
    /// ONS public sector classification guide, institutional units sheet.
    OnsInstitutional,
    /// ONS public sector classification guide, non-institutional units sheet.
    OnsNonInstitutional,
    /// NHS provider directory.
    NhsProviderDirectory,
    /// DEFRA UK-AIR local authority listing.
    DefraUkAir,
    /// Get Information About Schools bulk extract.
    Gias,
    /// Curated devolved administration records.
    DevolvedAdminStatic,
    /// police.uk forces API.
    PoliceUkApi,
    /// National Fire Chiefs Council service directory.
    Nfcc,
    /// gov.uk guidance page listings.
    GovUkGuidance,
    /// Association of Colleges regional membership figures.
    Aoc,
    /// Northern Ireland school directory export.
    NiEducation,
    /// England and Wales courts and tribunals CSV.
    UkCourtsCsv,
    /// Northern Ireland courts directory.
    NiCourts,
    /// Scottish Courts and Tribunals directory.
    ScottishCourts,
    /// Groundwork federation trust listing.
    Groundwork,
    /// NHS charities directory.
    NhsCharities,
    /// Wikipedia list of Welsh communities.
    WikipediaWelshCommunities,
    /// Wikipedia list of Scottish community council areas.
    WikipediaScottishCommunities,
    /// Northern Ireland health and social care trusts.
    NiHealth,
    /// ONS unitary authority listing.
    OnsUnitary,
    /// Wikipedia list of English districts.
    WikipediaDistricts,
    /// National Parks UK member listing.
    NationalparksUk,
    /// NHS integrated care boards directory.
    NhsIcbs,
    /// Healthwatch local network directory.
    Healthwatch,
    /// mygov.scot public body listing.
    MygovScot,
    /// NHS Scotland health board listing.
    NhsScotlandBoards,
    /// Transport Scotland regional transport partnerships.
    TransportScotlandRtps,
    /// law.gov.wales devolved body listing.
    LawGovWales,
    /// Department for Infrastructure NI port authorities.
    InfrastructureNiPorts,
    /// Northern Ireland Executive department listing.
    NiGovernment,
    /// UK Research and Innovation council listing.
    Ukri,
}

impl SourceId {
    /// Serialized token, matching the artifact format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GovUkApi => "gov_uk_api",
            Self::OnsInstitutional => "ons_institutional",
            Self::OnsNonInstitutional => "ons_non_institutional",
            Self::NhsProviderDirectory => "nhs_provider_directory",
            Self::DefraUkAir => "defra_uk_air",
            Self::Gias => "gias",
            Self::DevolvedAdminStatic => "devolved_admin_static",
            Self::PoliceUkApi => "police_uk_api",
            Self::Nfcc => "nfcc",
            Self::GovUkGuidance => "gov_uk_guidance",
            Self::Aoc => "aoc",
            Self::NiEducation => "ni_education",
            Self::UkCourtsCsv => "uk_courts_csv",
            Self::NiCourts => "ni_courts",
            Self::ScottishCourts => "scottish_courts",
            Self::Groundwork => "groundwork",
            Self::NhsCharities => "nhs_charities",
            Self::WikipediaWelshCommunities => "wikipedia_welsh_communities",
            Self::WikipediaScottishCommunities => "wikipedia_scottish_communities",
            Self::NiHealth => "ni_health",
            Self::OnsUnitary => "ons_unitary",
            Self::WikipediaDistricts => "wikipedia_districts",
            Self::NationalparksUk => "nationalparks_uk",
            Self::NhsIcbs => "nhs_icbs",
            Self::Healthwatch => "healthwatch",
            Self::MygovScot => "mygov_scot",
            Self::NhsScotlandBoards => "nhs_scotland_boards",
            Self::TransportScotlandRtps => "transport_scotland_rtps",
            Self::LawGovWales => "law_gov_wales",
            Self::InfrastructureNiPorts => "infrastructure_ni_ports",
            Self::NiGovernment => "ni_government",
            Self::Ukri => "ukri",
        }
    }

    /// Human-readable name for summary lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GovUkApi => "GOV.UK API",
            Self::OnsInstitutional => "ONS institutional units",
            Self::OnsNonInstitutional => "ONS non-institutional units",
            Self::NhsProviderDirectory => "NHS provider directory",
            Self::DefraUkAir => "DEFRA UK-AIR",
            Self::Gias => "Get Information About Schools",
            Self::DevolvedAdminStatic => "Devolved administrations",
            Self::PoliceUkApi => "Police.uk forces API",
            Self::Nfcc => "National Fire Chiefs Council",
            Self::GovUkGuidance => "GOV.UK guidance listings",
            Self::Aoc => "Association of Colleges",
            Self::NiEducation => "NI school directory",
            Self::UkCourtsCsv => "England and Wales courts",
            Self::NiCourts => "NI courts",
            Self::ScottishCourts => "Scottish courts",
            Self::Groundwork => "Groundwork trusts",
            Self::NhsCharities => "NHS charities",
            Self::WikipediaWelshCommunities => "Welsh communities (Wikipedia)",
            Self::WikipediaScottishCommunities => "Scottish communities (Wikipedia)",
            Self::NiHealth => "NI health trusts",
            Self::OnsUnitary => "ONS unitary authorities",
            Self::WikipediaDistricts => "English districts (Wikipedia)",
            Self::NationalparksUk => "National Parks UK",
            Self::NhsIcbs => "NHS integrated care boards",
            Self::Healthwatch => "Healthwatch network",
            Self::MygovScot => "mygov.scot public bodies",
            Self::NhsScotlandBoards => "NHS Scotland boards",
            Self::TransportScotlandRtps => "Transport Scotland RTPs",
            Self::LawGovWales => "law.gov.wales bodies",
            Self::InfrastructureNiPorts => "NI port authorities",
            Self::NiGovernment => "NI Executive departments",
            Self::Ukri => "UK Research and Innovation",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_token_matches_as_str() {
        for id in [
            SourceId::GovUkApi,
            SourceId::OnsNonInstitutional,
            SourceId::WikipediaWelshCommunities,
            SourceId::TransportScotlandRtps,
            SourceId::Ukri,
        ] {
            let token = serde_json::to_value(id).ok();
            assert_eq!(
                token,
                Some(serde_json::Value::String(id.as_str().to_string()))
            );
        }
    }

    #[test]
    fn tokens_round_trip() {
        let id: SourceId = serde_json::from_str("\"nhs_icbs\"").unwrap_or(SourceId::GovUkApi);
        assert_eq!(id, SourceId::NhsIcbs);
    }
}
