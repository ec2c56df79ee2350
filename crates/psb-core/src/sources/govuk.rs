//! GOV.UK drivers: the organisations content API and guidance-page listings.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::decode::json::{FieldExtractor, select_array, select_str};
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{
    DataOrigin, DataQuality, Organisation, OrganisationType, SourceId,
    infer_type_from_classification, map_status, parse_date,
};
use crate::sources::HtmlListSource;
use crate::{Error, Result};

const API_URL: &str = "https://www.gov.uk/api/organisations";

/// Central government departments and agencies never number fewer than this.
const GOVUK_FLOOR: usize = 600;

/// Pagination never legitimately runs this deep; treat it as a loop.
const MAX_PAGES: usize = 50;

// The fields one API result contributes, as a flat declaration.
const TITLE: FieldExtractor = FieldExtractor::required("title");
const SLUG: FieldExtractor = FieldExtractor::optional("details.slug");
const FORMAT: FieldExtractor = FieldExtractor::optional("format");
const GOVUK_STATUS: FieldExtractor = FieldExtractor::optional("details.govuk_status");
const CLOSED_AT: FieldExtractor = FieldExtractor::optional("details.closed_at");
const WEB_URL: FieldExtractor = FieldExtractor::optional("web_url");
const PARENT: FieldExtractor = FieldExtractor::optional("parent_organisations.0.title");
const ABBREVIATION: FieldExtractor = FieldExtractor::optional("details.abbreviation");

/// Driver for the GOV.UK content API organisation listing.
///
/// The API paginates through `next_page_url`; every page is fetched (through
/// the cache when enabled) and each result is mapped from its declared
/// `format` and `govuk_status`.
pub struct GovUkApiDriver;

#[async_trait]
impl Driver for GovUkApiDriver {
    fn id(&self) -> SourceId {
        SourceId::GovUkApi
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["gov_uk_api", "govuk", "gov-uk"]
    }

    fn description(&self) -> &'static str {
        "GOV.UK content API organisation register"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let mut records = Vec::new();
        let mut url = API_URL.to_string();
        let mut from_cache = false;

        for page in 0..MAX_PAGES {
            ctx.check_cancelled()?;
            let cache_key = format!("gov-uk-api-page-{page}");
            let (tree, origin) = ctx.fetch_json_cached(&cache_key, &url).await?;
            from_cache |= origin == DataOrigin::Cache;

            let results = select_array(&tree, "results");
            if results.is_empty() && page == 0 {
                return Err(Error::StructureChanged {
                    source_id: self.id().to_string(),
                    detail: "organisation listing returned no results array".into(),
                });
            }
            for raw in results {
                match map_organisation(raw, from_cache) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(source = %self.id(), "dropping result: {e}"),
                }
            }

            match select_str(&tree, "next_page_url") {
                Some(next) => url = next.to_string(),
                None => break,
            }
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, GOVUK_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(API_URL), records))
    }
}

fn map_organisation(raw: &Value, from_cache: bool) -> Result<Organisation> {
    let title = TITLE.extract_required(raw)?;
    let slug = SLUG.extract(raw)?.unwrap_or_else(|| title.clone());
    let format = FORMAT.extract(raw)?;

    let mut record = base_record(
        slug_id("govuk-", &slug),
        title,
        format
            .as_deref()
            .map_or(OrganisationType::Other, infer_type_from_classification),
        source_ref(SourceId::GovUkApi, Some(API_URL), 1.0),
    );
    record.classification = format;
    if let Some(status) = GOVUK_STATUS.extract(raw)? {
        record.status = map_status(&status);
    }
    if let Some(closed) = CLOSED_AT.extract(raw)? {
        record.dissolution_date = parse_date(&closed);
    }
    record.website = WEB_URL.extract(raw)?;
    record.parent_organisation = PARENT.extract(raw)?;
    if let Some(acronym) = ABBREVIATION.extract(raw)? {
        if acronym != record.name {
            record.alternative_names.push(acronym);
        }
    }
    if from_cache {
        record.data_quality = Some(DataQuality {
            completeness: record.completeness(),
            source: DataOrigin::Cache,
        });
    }
    Ok(record)
}

/// Driver for the GOV.UK guidance page listing fire and rescue authorities.
///
/// A plain scraped listing; the shape is owned by [`HtmlListSource`].
pub struct GovUkGuidanceDriver;

const GUIDANCE: HtmlListSource = HtmlListSource {
    source: SourceId::GovUkGuidance,
    url: "https://www.gov.uk/guidance/fire-and-rescue-authorities",
    item_selector: ".govuk-govspeak ul li",
    floor: 40,
    id_prefix: "fra-",
    org_type: OrganisationType::EmergencyService,
    classification: Some("Fire and rescue authority"),
    country: None,
    confidence: 0.9,
};

#[async_trait]
impl Driver for GovUkGuidanceDriver {
    fn id(&self) -> SourceId {
        SourceId::GovUkGuidance
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["gov_uk_guidance", "guidance", "fire-authorities"]
    }

    fn description(&self) -> &'static str {
        "GOV.UK guidance listing of fire and rescue authorities"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        GUIDANCE.run(ctx).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Status;
    use serde_json::json;

    #[test]
    fn maps_api_results() {
        let raw = json!({
            "title": "Department for Transport",
            "format": "Ministerial department",
            "web_url": "https://www.gov.uk/government/organisations/department-for-transport",
            "details": {
                "slug": "department-for-transport",
                "govuk_status": "live",
                "abbreviation": "DfT"
            },
            "parent_organisations": []
        });
        let record = map_organisation(&raw, false).unwrap();
        assert_eq!(record.id, "govuk-department-for-transport");
        assert_eq!(record.org_type, OrganisationType::MinisterialDepartment);
        assert_eq!(record.status, Status::Active);
        assert_eq!(record.alternative_names, vec!["DfT"]);
        assert_eq!(record.sources[0].source, SourceId::GovUkApi);
    }

    #[test]
    fn maps_closed_organisations_to_dissolved() {
        let raw = json!({
            "title": "UK Film Council",
            "format": "Executive NDPB",
            "details": {
                "slug": "uk-film-council",
                "govuk_status": "closed",
                "closed_at": "2011-03-31"
            }
        });
        let record = map_organisation(&raw, false).unwrap();
        assert_eq!(record.status, Status::Dissolved);
        assert_eq!(
            record.dissolution_date,
            chrono::NaiveDate::from_ymd_opt(2011, 3, 31)
        );
        assert_eq!(record.org_type, OrganisationType::ExecutiveNdpb);
    }

    #[test]
    fn results_without_title_are_rejected() {
        let err = map_organisation(&json!({"format": "Ministerial department"}), false);
        assert!(err.is_err());
    }
}
