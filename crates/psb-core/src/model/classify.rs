//! Structural classification of organisations and keyword-based inference
//! from source-specific category labels.

use serde::{Deserialize, Serialize};

/// Closed set of structural classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrganisationType {
    /// Central government department headed by a minister.
    MinisterialDepartment,
    /// Executive agency of a department.
    ExecutiveAgency,
    /// Executive non-departmental public body.
    ExecutiveNdpb,
    /// Advisory non-departmental public body.
    AdvisoryNdpb,
    /// Tribunal non-departmental public body.
    TribunalNdpb,
    /// Non-departmental public body of unspecified kind.
    Ndpb,
    /// Public corporation.
    PublicCorporation,
    /// Local authority.
    LocalAuthority,
    /// NHS trust.
    NhsTrust,
    /// NHS foundation trust.
    NhsFoundationTrust,
    /// Devolved administration.
    DevolvedAdministration,
    /// School, college, or university.
    EducationalInstitution,
    /// Police or fire service.
    EmergencyService,
    /// Court or tribunal venue.
    Court,
    /// Research council.
    ResearchCouncil,
    /// Community council (Wales/Scotland).
    CommunityCouncil,
    /// Health board.
    HealthBoard,
    /// Regional transport partnership.
    TransportPartnership,
    /// Unitary authority.
    UnitaryAuthority,
    /// District council.
    DistrictCouncil,
    /// National park authority.
    NationalPark,
    /// Anything that fits no other bucket.
    Other,
}

impl OrganisationType {
    /// Serialized token for this type, matching the artifact format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinisterialDepartment => "ministerial_department",
            Self::ExecutiveAgency => "executive_agency",
            Self::ExecutiveNdpb => "executive_ndpb",
            Self::AdvisoryNdpb => "advisory_ndpb",
            Self::TribunalNdpb => "tribunal_ndpb",
            Self::Ndpb => "ndpb",
            Self::PublicCorporation => "public_corporation",
            Self::LocalAuthority => "local_authority",
            Self::NhsTrust => "nhs_trust",
            Self::NhsFoundationTrust => "nhs_foundation_trust",
            Self::DevolvedAdministration => "devolved_administration",
            Self::EducationalInstitution => "educational_institution",
            Self::EmergencyService => "emergency_service",
            Self::Court => "court",
            Self::ResearchCouncil => "research_council",
            Self::CommunityCouncil => "community_council",
            Self::HealthBoard => "health_board",
            Self::TransportPartnership => "transport_partnership",
            Self::UnitaryAuthority => "unitary_authority",
            Self::DistrictCouncil => "district_council",
            Self::NationalPark => "national_park",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for OrganisationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table for classification inference. Longest match wins, so
/// "tribunal ndpb" beats "tribunal" and "nhs foundation trust" beats
/// "nhs trust".
const KEYWORD_RULES: &[(&str, OrganisationType)] = &[
    ("nhs foundation trust", OrganisationType::NhsFoundationTrust),
    ("foundation trust", OrganisationType::NhsFoundationTrust),
    ("nhs trust", OrganisationType::NhsTrust),
    (
        "ministerial department",
        OrganisationType::MinisterialDepartment,
    ),
    (
        "central government",
        OrganisationType::MinisterialDepartment,
    ),
    ("executive agency", OrganisationType::ExecutiveAgency),
    (
        "executive non-departmental public body",
        OrganisationType::ExecutiveNdpb,
    ),
    ("executive ndpb", OrganisationType::ExecutiveNdpb),
    (
        "advisory non-departmental public body",
        OrganisationType::AdvisoryNdpb,
    ),
    ("advisory ndpb", OrganisationType::AdvisoryNdpb),
    (
        "tribunal non-departmental public body",
        OrganisationType::TribunalNdpb,
    ),
    ("tribunal ndpb", OrganisationType::TribunalNdpb),
    ("non-departmental public body", OrganisationType::Ndpb),
    ("ndpb", OrganisationType::Ndpb),
    ("public corporation", OrganisationType::PublicCorporation),
    ("unitary authority", OrganisationType::UnitaryAuthority),
    ("district council", OrganisationType::DistrictCouncil),
    ("community council", OrganisationType::CommunityCouncil),
    ("local authority", OrganisationType::LocalAuthority),
    (
        "devolved administration",
        OrganisationType::DevolvedAdministration,
    ),
    ("devolved", OrganisationType::DevolvedAdministration),
    ("research council", OrganisationType::ResearchCouncil),
    ("health board", OrganisationType::HealthBoard),
    (
        "transport partnership",
        OrganisationType::TransportPartnership,
    ),
    ("national park", OrganisationType::NationalPark),
    ("educational", OrganisationType::EducationalInstitution),
    ("university", OrganisationType::EducationalInstitution),
    ("college", OrganisationType::EducationalInstitution),
    ("school", OrganisationType::EducationalInstitution),
    ("police", OrganisationType::EmergencyService),
    ("fire and rescue", OrganisationType::EmergencyService),
    ("fire service", OrganisationType::EmergencyService),
    ("tribunal", OrganisationType::Court),
    ("court", OrganisationType::Court),
];

/// Infer a structural type from a free-text classification label.
///
/// Matching is case-insensitive and the longest matching keyword wins.
/// Returns [`OrganisationType::Other`] when nothing matches.
#[must_use]
pub fn infer_type_from_classification(classification: &str) -> OrganisationType {
    let haystack = classification.to_lowercase();
    KEYWORD_RULES
        .iter()
        .filter(|(keyword, _)| haystack.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map_or(OrganisationType::Other, |(_, org_type)| *org_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_documented_examples() {
        assert_eq!(
            infer_type_from_classification("Local Authority"),
            OrganisationType::LocalAuthority
        );
        assert_eq!(
            infer_type_from_classification("NHS Foundation Trust"),
            OrganisationType::NhsFoundationTrust
        );
        assert_eq!(
            infer_type_from_classification("Tribunal NDPB"),
            OrganisationType::TribunalNdpb
        );
    }

    #[test]
    fn longest_match_wins() {
        // "NHS Foundation Trust" contains "nhs trust"? No, but "foundation
        // trust" and "trust" overlap; the longer keyword must take priority.
        assert_eq!(
            infer_type_from_classification("Barnsley NHS Foundation Trust"),
            OrganisationType::NhsFoundationTrust
        );
        // "tribunal" alone maps to court, but the NDPB suffix promotes it.
        assert_eq!(
            infer_type_from_classification("tribunal"),
            OrganisationType::Court
        );
        assert_eq!(
            infer_type_from_classification("Executive non-departmental public body"),
            OrganisationType::ExecutiveNdpb
        );
    }

    #[test]
    fn unknown_labels_fall_back_to_other() {
        assert_eq!(
            infer_type_from_classification("Sui generis body"),
            OrganisationType::Other
        );
        assert_eq!(infer_type_from_classification(""), OrganisationType::Other);
    }

    #[test]
    fn emergency_services_cover_police_and_fire() {
        assert_eq!(
            infer_type_from_classification("Territorial police force"),
            OrganisationType::EmergencyService
        );
        assert_eq!(
            infer_type_from_classification("Fire and Rescue Authority"),
            OrganisationType::EmergencyService
        );
    }

    #[test]
    fn tokens_are_stable() {
        assert_eq!(
            OrganisationType::NhsFoundationTrust.as_str(),
            "nhs_foundation_trust"
        );
        assert_eq!(
            serde_json::to_value(OrganisationType::TribunalNdpb).ok(),
            Some(serde_json::Value::String("tribunal_ndpb".into()))
        );
    }
}
