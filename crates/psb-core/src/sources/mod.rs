//! Source drivers, one module per source family.
//!
//! Each driver implements [`crate::driver::Driver`] for one external data
//! source. The simple directory-page scrapers share [`HtmlListSource`], a
//! parameterised fetch → parse → map pipeline; everything with source-specific
//! hard bits (pagination, link discovery, multi-sheet workbooks, PDF count
//! validation, composite sub-sources) gets bespoke code in its own module.

pub mod colleges;
pub mod communities;
pub mod courts;
pub mod devolved;
pub mod emergency;
pub mod govuk;
pub mod local_authorities;
pub mod misc;
pub mod nhs;
pub mod ni;
pub mod ons;
pub mod schools;
pub mod scotland;
pub mod wales;

use crate::decode;
use crate::driver::{
    DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id, source_ref,
};
use crate::model::{
    DataOrigin, DataQuality, Location, Organisation, OrganisationType, SourceId,
};
use crate::Result;

/// A declarative scraped-list source: one page, one selector, one record per
/// distinct matched name.
pub(crate) struct HtmlListSource {
    /// Which registered source this is.
    pub source: SourceId,
    /// Page to fetch.
    pub url: &'static str,
    /// CSS selector matching one element per organisation name.
    pub item_selector: &'static str,
    /// Sanity floor; fewer distinct names fails the driver.
    pub floor: usize,
    /// Record id prefix.
    pub id_prefix: &'static str,
    /// Structural type for every record.
    pub org_type: OrganisationType,
    /// Classification label, when the listing implies one.
    pub classification: Option<&'static str>,
    /// Country for the location sub-record, when the listing implies one.
    pub country: Option<&'static str>,
    /// Mapping confidence recorded in provenance.
    pub confidence: f64,
}

impl HtmlListSource {
    /// Run the shared pipeline: fetch (via cache when enabled), require the
    /// expected DOM shape, map distinct names to records, enforce the floor.
    pub(crate) async fn run(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let (text, origin) = ctx.fetch_text_cached(self.source.as_str(), self.url).await?;
        ctx.check_cancelled()?;

        let names = {
            let doc = decode::html::parse(&text);
            decode::html::require_texts(&doc, self.item_selector, self.source.as_str())?
        };

        let records = self.map_names(names, origin);
        let records = retain_valid(records, self.source);
        enforce_floor(&records, self.floor)?;
        Ok(DriverReport::new(self.source, Some(self.url), records))
    }

    fn map_names(&self, names: Vec<String>, origin: DataOrigin) -> Vec<Organisation> {
        let provenance = source_ref(self.source, Some(self.url), self.confidence);
        let mut seen = std::collections::HashSet::new();
        let mut records = Vec::new();
        for name in names {
            let id = slug_id(self.id_prefix, &name);
            if !seen.insert(id.clone()) {
                continue;
            }
            let mut record = base_record(id, name, self.org_type, provenance.clone());
            record.classification = self.classification.map(ToString::to_string);
            if let Some(country) = self.country {
                record.location = Some(Location {
                    country: Some(country.to_string()),
                    ..Location::default()
                });
            }
            if origin != DataOrigin::Live {
                record.data_quality = Some(DataQuality {
                    completeness: record.completeness(),
                    source: origin,
                });
            }
            records.push(record);
        }
        records
    }
}
