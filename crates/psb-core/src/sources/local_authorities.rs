//! Local government drivers: ONS unitary authorities and English districts.

use async_trait::async_trait;

use crate::decode::{csv, html};
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::{Error, Result};

const UNITARY_PAGE: &str =
    "https://www.ons.gov.uk/aboutus/transparencyandgovernance/freedomofinformationfoi/unitaryauthoritiesintheuk";

const UNITARY_FLOOR: usize = 50;

/// Driver for the ONS unitary authority listing.
///
/// The page links its data as a CSV download whose href is often a
/// `format=csv` query rather than a `.csv` suffix, so discovery accepts
/// either; no link at all is a discovery failure.
pub struct OnsUnitaryDriver;

#[async_trait]
impl Driver for OnsUnitaryDriver {
    fn id(&self) -> SourceId {
        SourceId::OnsUnitary
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["ons_unitary", "unitary", "unitary-authorities"]
    }

    fn description(&self) -> &'static str {
        "ONS unitary authority listing (dynamic CSV)"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let page = ctx.fetch(UNITARY_PAGE).await?.text();
        ctx.check_cancelled()?;

        let csv_url = discover_csv_link(&page).ok_or_else(|| Error::LinkDiscovery {
            source_id: self.id().to_string(),
            detail: "no CSV download link on the unitary authorities page".into(),
        })?;

        let payload = ctx.fetch_accept(&csv_url, "text/csv").await?;
        ctx.check_cancelled()?;

        let provenance = source_ref(self.id(), Some(csv_url.as_str()), 1.0);
        let mut records = Vec::new();
        csv::for_each_row(&payload.bytes, |headers, row| {
            // Geography extracts pair a code column (…CD) with a name column
            // (…NM); the prefix carries the snapshot year, so match on the
            // suffix instead of a hard-coded header.
            let code = headers
                .find_by_suffix("cd")
                .map(ToString::to_string)
                .and_then(|col| row.get(&col).map(ToString::to_string));
            let name = headers
                .find_by_suffix("nm")
                .map(ToString::to_string)
                .and_then(|col| row.get(&col).map(ToString::to_string));
            let Some(name) = name else {
                return Ok(());
            };
            let code = code.as_deref();
            let name = name.as_str();

            let id = code.map_or_else(|| slug_id("unitary-", name), |c| format!("unitary-{c}"));
            let mut record = base_record(
                id,
                name.to_string(),
                OrganisationType::UnitaryAuthority,
                provenance.clone(),
            );
            record.classification = Some("Unitary authority".into());
            if let Some(code) = code {
                record
                    .additional_properties
                    .insert("onsCode".into(), code.into());
            }
            records.push(record);
            Ok(())
        })?;

        let records = retain_valid(records, self.id());
        enforce_floor(&records, UNITARY_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(csv_url.as_str()), records))
    }
}

fn discover_csv_link(page: &str) -> Option<String> {
    let doc = html::parse(page);
    let hrefs = html::select_attrs(&doc, "a[href]", "href").ok()?;
    let href = hrefs.into_iter().find(|href| {
        let lower = href.to_lowercase();
        lower.ends_with(".csv") || lower.contains("format=csv")
    })?;
    Some(if href.starts_with("http") {
        href
    } else {
        format!("https://www.ons.gov.uk{href}")
    })
}

/// Driver for the Wikipedia table of English districts.
pub struct WikipediaDistrictsDriver;

const DISTRICTS: HtmlListSource = HtmlListSource {
    source: SourceId::WikipediaDistricts,
    url: "https://en.wikipedia.org/wiki/Districts_of_England",
    item_selector: "table.wikitable tbody tr td:first-child a",
    floor: 150,
    id_prefix: "district-",
    org_type: OrganisationType::DistrictCouncil,
    classification: Some("District council"),
    country: Some("England"),
    confidence: 0.8,
};

#[async_trait]
impl Driver for WikipediaDistrictsDriver {
    fn id(&self) -> SourceId {
        SourceId::WikipediaDistricts
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["wikipedia_districts", "districts"]
    }

    fn description(&self) -> &'static str {
        "English districts from Wikipedia"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        DISTRICTS.run(ctx).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn discovers_csv_links_in_both_shapes() {
        let suffix = r#"<html><body><a href="/file/unitary.csv">Download</a></body></html>"#;
        assert_eq!(
            discover_csv_link(suffix).unwrap(),
            "https://www.ons.gov.uk/file/unitary.csv"
        );

        let query = r#"<html><body>
            <a href="https://geoportal.example.com/datasets/ua?format=csv&latest=true">CSV</a>
        </body></html>"#;
        assert!(discover_csv_link(query).unwrap().contains("format=csv"));

        let none = r#"<html><body><a href="/about">About</a></body></html>"#;
        assert!(discover_csv_link(none).is_none());
    }
}
