//! Community council drivers sourced from Wikipedia lists.

use async_trait::async_trait;

use crate::driver::{Driver, DriverContext, DriverReport};
use crate::model::{OrganisationType, SourceId};
use crate::sources::HtmlListSource;
use crate::Result;

const WELSH: HtmlListSource = HtmlListSource {
    source: SourceId::WikipediaWelshCommunities,
    url: "https://en.wikipedia.org/wiki/List_of_communities_in_Wales",
    item_selector: "table.wikitable tbody tr td:first-child a",
    floor: 600,
    id_prefix: "WCC_",
    org_type: OrganisationType::CommunityCouncil,
    classification: Some("Community council"),
    country: Some("Wales"),
    confidence: 0.8,
};

const SCOTTISH: HtmlListSource = HtmlListSource {
    source: SourceId::WikipediaScottishCommunities,
    url: "https://en.wikipedia.org/wiki/List_of_community_council_areas_in_Scotland",
    item_selector: ".mw-parser-output ul li a",
    floor: 1000,
    id_prefix: "SCC_",
    org_type: OrganisationType::CommunityCouncil,
    classification: Some("Community council"),
    country: Some("Scotland"),
    confidence: 0.8,
};

/// Driver for the Wikipedia list of Welsh communities.
pub struct WelshCommunitiesDriver;

#[async_trait]
impl Driver for WelshCommunitiesDriver {
    fn id(&self) -> SourceId {
        SourceId::WikipediaWelshCommunities
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["wikipedia_welsh_communities", "welsh-communities"]
    }

    fn description(&self) -> &'static str {
        "Welsh communities from Wikipedia"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        WELSH.run(ctx).await
    }
}

/// Driver for the Wikipedia list of Scottish community council areas.
pub struct ScottishCommunitiesDriver;

#[async_trait]
impl Driver for ScottishCommunitiesDriver {
    fn id(&self) -> SourceId {
        SourceId::WikipediaScottishCommunities
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["wikipedia_scottish_communities", "scottish-communities"]
    }

    fn description(&self) -> &'static str {
        "Scottish community council areas from Wikipedia"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        SCOTTISH.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_prefixes_match_the_provenance_convention() {
        assert_eq!(WELSH.id_prefix, "WCC_");
        assert_eq!(SCOTTISH.id_prefix, "SCC_");
    }
}
