//! Welsh public body drivers.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const LAW_WALES: HtmlListSource = HtmlListSource {
    source: SourceId::LawGovWales,
    url: "https://law.gov.wales/constitution-government/public-bodies-wales",
    item_selector: "article ul li a, .field--name-body ul li a",
    floor: 30,
    id_prefix: "wales-",
    org_type: OrganisationType::Other,
    classification: Some("Welsh public body"),
    country: Some("Wales"),
    confidence: 0.9,
};

/// Driver for the law.gov.wales devolved public body listing.
pub struct LawGovWalesDriver;

#[async_trait]
impl Driver for LawGovWalesDriver {
    fn id(&self) -> SourceId {
        SourceId::LawGovWales
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["law_gov_wales", "wales", "welsh-bodies"]
    }

    fn description(&self) -> &'static str {
        "Welsh public bodies from law.gov.wales"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        LAW_WALES.run(ctx).await
    }
}
