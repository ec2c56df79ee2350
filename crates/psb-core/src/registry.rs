//! The driver registry: every known source, in a fixed order.
//!
//! Registry order is load-bearing in one place: when the dedup engine has no
//! documented priority for a field, earlier sources outrank later ones, so
//! the authoritative registers come first.

use std::sync::Arc;

use crate::driver::Driver;
use crate::sources::{
    colleges::AocDriver,
    communities::{ScottishCommunitiesDriver, WelshCommunitiesDriver},
    courts::CourtsDriver,
    devolved::DevolvedAdminDriver,
    emergency::{NfccDriver, PoliceUkApiDriver},
    govuk::{GovUkApiDriver, GovUkGuidanceDriver},
    local_authorities::{OnsUnitaryDriver, WikipediaDistrictsDriver},
    misc::{DefraUkAirDriver, GroundworkDriver, NationalParksDriver, UkriDriver},
    nhs::{HealthwatchDriver, NhsCharitiesDriver, NhsIcbsDriver, NhsProviderDirectoryDriver},
    ni::{InfrastructureNiPortsDriver, NiGovernmentDriver, NiHealthDriver},
    ons::{OnsInstitutionalDriver, OnsNonInstitutionalDriver},
    schools::{GiasDriver, NiEducationDriver},
    scotland::{MygovScotDriver, NhsScotlandBoardsDriver, TransportScotlandRtpsDriver},
    wales::LawGovWalesDriver,
};

/// Every registered driver, authoritative registers first.
#[must_use]
pub fn registry() -> Vec<Arc<dyn Driver>> {
    vec![
        Arc::new(GovUkApiDriver),
        Arc::new(OnsInstitutionalDriver),
        Arc::new(OnsNonInstitutionalDriver),
        Arc::new(NhsProviderDirectoryDriver),
        Arc::new(DefraUkAirDriver),
        Arc::new(GiasDriver),
        Arc::new(DevolvedAdminDriver),
        Arc::new(PoliceUkApiDriver),
        Arc::new(NfccDriver),
        Arc::new(GovUkGuidanceDriver),
        Arc::new(AocDriver),
        Arc::new(NiEducationDriver),
        Arc::new(CourtsDriver),
        Arc::new(GroundworkDriver),
        Arc::new(NhsCharitiesDriver),
        Arc::new(WelshCommunitiesDriver),
        Arc::new(ScottishCommunitiesDriver),
        Arc::new(NiHealthDriver),
        Arc::new(OnsUnitaryDriver),
        Arc::new(WikipediaDistrictsDriver),
        Arc::new(NationalParksDriver),
        Arc::new(NhsIcbsDriver),
        Arc::new(HealthwatchDriver),
        Arc::new(MygovScotDriver),
        Arc::new(NhsScotlandBoardsDriver),
        Arc::new(TransportScotlandRtpsDriver),
        Arc::new(LawGovWalesDriver),
        Arc::new(InfrastructureNiPortsDriver),
        Arc::new(NiGovernmentDriver),
        Arc::new(UkriDriver),
    ]
}

/// Drivers matching a `--source` filter, or every driver when there is none.
///
/// Matching is a case-insensitive exact comparison against each driver's
/// filter aliases.
#[must_use]
pub fn select(filter: Option<&str>) -> Vec<Arc<dyn Driver>> {
    let drivers = registry();
    let Some(filter) = filter else {
        return drivers;
    };
    drivers
        .into_iter()
        .filter(|driver| {
            driver
                .filter_aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(filter))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_covers_every_source_once() {
        let drivers = registry();
        let ids: HashSet<_> = drivers.iter().map(|d| d.id()).collect();
        // The courts driver carries its three sub-sources under one id, so
        // the registry holds 30 drivers for the 32 registered sources.
        assert_eq!(drivers.len(), 30);
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn aliases_are_unique_across_drivers() {
        let mut seen = HashSet::new();
        for driver in registry() {
            for alias in driver.filter_aliases() {
                assert!(
                    seen.insert(alias.to_lowercase()),
                    "duplicate alias '{alias}'"
                );
            }
        }
    }

    #[test]
    fn filter_selects_by_alias_case_insensitively() {
        assert_eq!(select(Some("GIAS")).len(), 1);
        assert_eq!(select(Some("gov_uk_api")).len(), 1);
        assert_eq!(select(Some("scottish_courts")).len(), 1);
        assert!(select(Some("not-a-source")).is_empty());
        assert_eq!(select(None).len(), registry().len());
    }
}
