//! School directory drivers: the GIAS bulk extract and the NI directory.

use async_trait::async_trait;

use crate::decode::csv;
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{Location, OrganisationType, SourceId, map_status, parse_date};
use crate::{Error, Result};

const GIAS_URL: &str =
    "https://ea-edubase-api-prod.azurewebsites.net/edubase/downloads/public/edubasealldata.csv";

/// England alone has well over fifty thousand establishments on record.
const GIAS_FLOOR: usize = 50_000;

const NI_URL: &str =
    "https://www.education-ni.gov.uk/publications/school-level-data-institutions-export.csv";

const NI_FLOOR: usize = 800;

/// Driver for the Get Information About Schools bulk CSV.
///
/// The extract is large; rows stream through the decoder once and rows
/// missing the URN or establishment name are rejected on the spot.
pub struct GiasDriver;

#[async_trait]
impl Driver for GiasDriver {
    fn id(&self) -> SourceId {
        SourceId::Gias
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["gias", "schools", "edubase"]
    }

    fn description(&self) -> &'static str {
        "Get Information About Schools bulk extract"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let payload = ctx.fetch_accept(GIAS_URL, "text/csv").await?;
        ctx.check_cancelled()?;

        let provenance = source_ref(self.id(), Some(GIAS_URL), 1.0);
        let mut records = Vec::new();
        let headers = csv::for_each_row(&payload.bytes, |_, row| {
            // Required-field check: no URN or no name, no record.
            let (Some(urn), Some(name)) = (row.get("URN"), row.get("EstablishmentName")) else {
                return Ok(());
            };

            let mut record = base_record(
                format!("gias-{urn}"),
                name.to_string(),
                OrganisationType::EducationalInstitution,
                provenance.clone(),
            );
            if let Some(status) = row.get("EstablishmentStatus (name)") {
                record.status = map_status(status);
            }
            if let Some(opened) = row.get("OpenDate") {
                record.establishment_date = parse_date(opened);
            }
            if let Some(closed) = row.get("CloseDate") {
                record.dissolution_date = parse_date(closed);
            }
            if let Some(website) = row.get("SchoolWebsite") {
                record.website = Some(website.to_string());
            }
            let location = Location {
                country: Some("England".into()),
                region: row.get("GOR (name)").map(ToString::to_string),
                address: row.get("Street").map(ToString::to_string),
                postal_code: row.get("Postcode").map(ToString::to_string),
                coordinates: None,
            };
            record.location = Some(location);
            if let Some(la) = row.get("LA (name)") {
                record
                    .additional_properties
                    .insert("localAuthority".into(), la.into());
            }
            if let Some(phase) = row.get("PhaseOfEducation (name)") {
                record.classification = Some(phase.to_string());
            }
            records.push(record);
            Ok(())
        })?;

        if !headers.contains_all(&["URN", "EstablishmentName"]) {
            return Err(Error::StructureChanged {
                source_id: self.id().to_string(),
                detail: "URN or EstablishmentName column missing from extract".into(),
            });
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, GIAS_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(GIAS_URL), records))
    }
}

/// Driver for the Northern Ireland school directory export.
pub struct NiEducationDriver;

#[async_trait]
impl Driver for NiEducationDriver {
    fn id(&self) -> SourceId {
        SourceId::NiEducation
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ni_education", "ni-schools"]
    }

    fn description(&self) -> &'static str {
        "Northern Ireland school directory export"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let payload = ctx.fetch_accept(NI_URL, "text/csv").await?;
        ctx.check_cancelled()?;

        let provenance = source_ref(self.id(), Some(NI_URL), 1.0);
        let mut records = Vec::new();
        let headers = csv::for_each_row(&payload.bytes, |_, row| {
            let Some(name) = row.get("Institution Name") else {
                return Ok(());
            };
            let reference = row.get("Institution Reference Number");

            let id = reference.map_or_else(
                || slug_id("ni-school-", name),
                |r| format!("ni-school-{r}"),
            );
            let mut record = base_record(
                id,
                name.to_string(),
                OrganisationType::EducationalInstitution,
                provenance.clone(),
            );
            record.location = Some(Location {
                country: Some("Northern Ireland".into()),
                region: None,
                address: row.get("Address 1").map(ToString::to_string),
                postal_code: row.get("Postcode").map(ToString::to_string),
                coordinates: None,
            });
            if let Some(kind) = row.get("Institution Type") {
                record.classification = Some(kind.to_string());
            }
            if let Some(status) = row.get("Status") {
                record.status = map_status(status);
            }
            records.push(record);
            Ok(())
        })?;

        if !headers.contains_all(&["Institution Name"]) {
            return Err(Error::StructureChanged {
                source_id: self.id().to_string(),
                detail: "Institution Name column missing from export".into(),
            });
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, NI_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(NI_URL), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Floors document real-world source sizes; pin them so a refactor cannot
    // quietly weaken the sanity check.
    #[test]
    fn floors_match_source_scale() {
        assert_eq!(GIAS_FLOOR, 50_000);
        assert!(NI_FLOOR >= 500);
    }
}
