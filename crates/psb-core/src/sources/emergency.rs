//! Emergency service drivers: police forces and fire services.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::decode::json::FieldExtractor;
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{Organisation, OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::{Error, Result};

const FORCES_URL: &str = "https://data.police.uk/api/forces";

/// Territorial forces plus the nationals; the list never shrinks below this.
const POLICE_FLOOR: usize = 45;

// List-phase and detail-phase fields, as flat declarations.
const FORCE_ID: FieldExtractor = FieldExtractor::required("id");
const FORCE_NAME: FieldExtractor = FieldExtractor::required("name");
const FORCE_WEBSITE: FieldExtractor = FieldExtractor::optional("url");
const FORCE_TELEPHONE: FieldExtractor = FieldExtractor::optional("telephone");

/// Driver for the police.uk forces API.
///
/// Two-phase fetch: the list endpoint yields `{id, name}` pairs, then each
/// force's detail endpoint fills in website and contact fields. A failed
/// detail call downgrades that force to its list-only fields and is reported
/// as a partial warning rather than failing the driver.
pub struct PoliceUkApiDriver;

#[async_trait]
impl Driver for PoliceUkApiDriver {
    fn id(&self) -> SourceId {
        SourceId::PoliceUkApi
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["police_uk_api", "police", "police-uk"]
    }

    fn description(&self) -> &'static str {
        "police.uk forces API with per-force detail"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let (list, _) = ctx.fetch_json_cached("police-uk-forces", FORCES_URL).await?;
        let forces = list.as_array().ok_or_else(|| Error::StructureChanged {
            source_id: self.id().to_string(),
            detail: "forces listing is not an array".into(),
        })?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();

        for force in forces {
            ctx.check_cancelled()?;
            let (force_id, mut record) = match map_force(force) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(source = %self.id(), "dropping force: {e}");
                    continue;
                }
            };

            let detail_url = format!("{FORCES_URL}/{force_id}");
            match ctx.fetch_accept(&detail_url, "application/json").await {
                Ok(payload) => {
                    if let Ok(detail) = crate::decode::json::parse(&payload.bytes) {
                        apply_detail(&mut record, &detail);
                    }
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    // List-only record still goes out; the miss is reported.
                    warnings.push(e);
                }
            }
            records.push(record);
        }

        let records = retain_valid(records, self.id());
        enforce_floor(&records, POLICE_FLOOR)?;
        Ok(DriverReport::new(self.id(), Some(FORCES_URL), records).with_warnings(warnings))
    }
}

/// Map one list-phase entry, returning the API's force id alongside the
/// record so the detail fetch can address the force verbatim.
fn map_force(raw: &Value) -> Result<(String, Organisation)> {
    let force_id = FORCE_ID.extract_required(raw)?;
    let name = FORCE_NAME.extract_required(raw)?;
    let mut record = base_record(
        slug_id("police-", &force_id),
        name,
        OrganisationType::EmergencyService,
        source_ref(SourceId::PoliceUkApi, Some(FORCES_URL), 1.0),
    );
    record.classification = Some("Territorial police force".into());
    Ok((force_id, record))
}

fn apply_detail(record: &mut Organisation, detail: &Value) {
    if let Ok(Some(url)) = FORCE_WEBSITE.extract(detail) {
        record.website = Some(url);
    }
    if let Ok(Some(phone)) = FORCE_TELEPHONE.extract(detail) {
        record
            .additional_properties
            .insert("telephone".into(), phone.into());
    }
}

/// Driver for the National Fire Chiefs Council service directory.
pub struct NfccDriver;

const NFCC: HtmlListSource = HtmlListSource {
    source: SourceId::Nfcc,
    url: "https://nfcc.org.uk/contacts/fire-and-rescue-services/",
    item_selector: ".fire-services-list li a, .entry-content ul li a",
    floor: 45,
    id_prefix: "fire-",
    org_type: OrganisationType::EmergencyService,
    classification: Some("Fire and rescue service"),
    country: None,
    confidence: 0.9,
};

#[async_trait]
impl Driver for NfccDriver {
    fn id(&self) -> SourceId {
        SourceId::Nfcc
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["nfcc", "fire", "fire-services"]
    }

    fn description(&self) -> &'static str {
        "National Fire Chiefs Council service directory"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        NFCC.run(ctx).await
    }
}
