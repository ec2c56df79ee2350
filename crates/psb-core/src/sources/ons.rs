//! ONS public sector classification guide drivers.
//!
//! The ONS publishes the classification guide as an Excel workbook whose
//! filename changes with every release, so both drivers first scrape the
//! dataset page for the newest `pscg*.xlsx` link, then download and read the
//! sheet they own. A missing sheet or column is a structural failure before
//! any row is emitted.

use async_trait::async_trait;

use crate::decode::{excel::Workbook, html};
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{OrganisationType, SourceId, infer_type_from_classification};
use crate::{Error, Result};

const DATASET_PAGE: &str =
    "https://www.ons.gov.uk/economy/nationalaccounts/uksectoraccounts/datasets/publicsectorclassificationguide";

const INSTITUTIONAL_NAME_COL: &str = "Organisation name";
const NON_INSTITUTIONAL_NAME_COL: &str = "Non-Institutional Unit name";
const SPONSOR_COL: &str = "Sponsoring Entity";

const INSTITUTIONAL_FLOOR: usize = 500;
const NON_INSTITUTIONAL_FLOOR: usize = 100;

/// Locate the newest classification guide workbook on the dataset page.
///
/// The link text changes and the href is versioned (`pscgjune2025.xlsx` and
/// similar), so discovery matches on the `pscg` stem and the extension.
async fn discover_workbook_url(ctx: &DriverContext, source: SourceId) -> Result<String> {
    let page = ctx.fetch(DATASET_PAGE).await?.text();
    ctx.check_cancelled()?;

    let hrefs = {
        let doc = html::parse(&page);
        html::select_attrs(&doc, "a[href]", "href")?
    };
    let candidate = hrefs.into_iter().find(|href| {
        let lower = href.to_lowercase();
        lower.contains("pscg") && lower.ends_with(".xlsx")
    });

    let href = candidate.ok_or_else(|| Error::LinkDiscovery {
        source_id: source.to_string(),
        detail: "no pscg*.xlsx link on the dataset page".into(),
    })?;
    if href.starts_with("http") {
        Ok(href)
    } else {
        Ok(format!("https://www.ons.gov.uk{href}"))
    }
}

/// Download the workbook and open the sheet whose name matches `sheet_pred`,
/// verifying `required_columns` before any rows are read.
async fn open_sheet(
    ctx: &DriverContext,
    source: SourceId,
    sheet_pred: impl Fn(&str) -> bool,
    required_columns: &[&str],
) -> Result<(String, crate::decode::excel::Sheet)> {
    let url = discover_workbook_url(ctx, source).await?;
    let payload = ctx.fetch(&url).await?;
    ctx.check_cancelled()?;

    let mut workbook = Workbook::from_bytes(payload.bytes)?;
    let sheet_name = workbook
        .sheet_names()
        .into_iter()
        .find(|name| sheet_pred(&name.to_lowercase()))
        .ok_or_else(|| Error::StructureChanged {
            source_id: source.to_string(),
            detail: "expected classification sheet is missing from the workbook".into(),
        })?;

    let sheet = workbook
        .sheet_with_headers(&sheet_name, required_columns)
        .map_err(|e| Error::StructureChanged {
            source_id: source.to_string(),
            detail: e.to_string(),
        })?;
    Ok((url, sheet))
}

/// Driver for the institutional units sheet.
pub struct OnsInstitutionalDriver;

#[async_trait]
impl Driver for OnsInstitutionalDriver {
    fn id(&self) -> SourceId {
        SourceId::OnsInstitutional
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ons_institutional", "ons", "ons-institutional"]
    }

    fn description(&self) -> &'static str {
        "ONS classification guide, institutional units"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let (url, sheet) = open_sheet(
            ctx,
            self.id(),
            |name| name.contains("institutional unit") && !name.contains("non"),
            &[INSTITUTIONAL_NAME_COL],
        )
        .await?;
        ctx.check_cancelled()?;

        let provenance = source_ref(self.id(), Some(url.as_str()), 1.0);
        let mut records = Vec::new();
        for row in sheet.rows() {
            let Some(name) = row.get(INSTITUTIONAL_NAME_COL) else {
                continue;
            };
            let ons_code = row.get("ONS code");
            let classification = row
                .get("Sector classification")
                .or_else(|| row.get("Classification"));

            let id = ons_code.map_or_else(|| slug_id("ons-", name), |code| format!("ons-{code}"));
            let mut record = base_record(
                id,
                name.to_string(),
                classification.map_or(OrganisationType::Other, infer_type_from_classification),
                provenance.clone(),
            );
            record.classification = classification.map(ToString::to_string);
            if let Some(code) = ons_code {
                record
                    .additional_properties
                    .insert("onsCode".into(), code.into());
            }
            if let Some(esa) = row.get("ESA 2010 code").or_else(|| row.get("ESA code")) {
                record
                    .additional_properties
                    .insert("esaCode".into(), esa.into());
            }
            records.push(record);
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, INSTITUTIONAL_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(url.as_str()), records))
    }
}

/// Driver for the non-institutional units sheet.
///
/// Non-institutional units have no legal identity of their own; the
/// sponsoring entity column is required and becomes `controllingUnit`.
pub struct OnsNonInstitutionalDriver;

#[async_trait]
impl Driver for OnsNonInstitutionalDriver {
    fn id(&self) -> SourceId {
        SourceId::OnsNonInstitutional
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ons_non_institutional", "ons-non-institutional"]
    }

    fn description(&self) -> &'static str {
        "ONS classification guide, non-institutional units"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let (url, sheet) = open_sheet(
            ctx,
            self.id(),
            |name| name.contains("non-institutional"),
            &[NON_INSTITUTIONAL_NAME_COL, SPONSOR_COL],
        )
        .await?;
        ctx.check_cancelled()?;

        let provenance = source_ref(self.id(), Some(url.as_str()), 1.0);
        let mut records = Vec::new();
        for row in sheet.rows() {
            let Some(name) = row.get(NON_INSTITUTIONAL_NAME_COL) else {
                continue;
            };
            let classification = row
                .get("Sector classification")
                .or_else(|| row.get("Classification"));

            let mut record = base_record(
                slug_id("ons-niu-", name),
                name.to_string(),
                classification.map_or(OrganisationType::Other, infer_type_from_classification),
                provenance.clone(),
            );
            record.classification = classification.map(ToString::to_string);
            record.controlling_unit = row.get(SPONSOR_COL).map(ToString::to_string);
            records.push(record);
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, NON_INSTITUTIONAL_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(url.as_str()), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_predicates_distinguish_the_two_sheets() {
        let institutional = |name: &str| name.contains("institutional unit") && !name.contains("non");
        assert!(institutional("organisation|institutional unit"));
        assert!(!institutional("non-institutional units"));

        let non_institutional = |name: &str| name.contains("non-institutional");
        assert!(non_institutional("non-institutional units"));
        assert!(!non_institutional("organisation|institutional unit"));
    }
}
