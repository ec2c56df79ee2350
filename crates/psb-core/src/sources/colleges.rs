//! Association of Colleges driver.
//!
//! The AoC membership page reports a college count per devolved nation and
//! links a PDF membership list for each. The pipeline extracts both, parses
//! the PDFs into names, and refuses to emit a region whose parsed count does
//! not equal the count the page reported. A mismatched region fails alone;
//! the other regions still go out.

use async_trait::async_trait;
use regex::Regex;

use crate::decode::{html, pdf};
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, retain_valid, slug_id, source_ref,
};
use crate::model::{Location, Organisation, OrganisationType, SourceId};
use crate::{Error, Result};

const PAGE_URL: &str = "https://www.aoc.co.uk/about/list-of-colleges-in-the-uk";

const REGIONS: &[&str] = &["Scotland", "Wales", "Northern Ireland"];

/// One region's extract from the aggregator page.
#[derive(Debug, PartialEq, Eq)]
struct RegionListing {
    region: String,
    expected_count: usize,
    pdf_url: String,
}

/// Driver for the AoC college membership lists.
pub struct AocDriver;

#[async_trait]
impl Driver for AocDriver {
    fn id(&self) -> SourceId {
        SourceId::Aoc
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &["aoc", "colleges"]
    }

    fn description(&self) -> &'static str {
        "Association of Colleges membership lists (PDF)"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let page = ctx.fetch(PAGE_URL).await?.text();
        ctx.check_cancelled()?;

        let listings = parse_region_listings(&page)?;

        let mut records = Vec::new();
        let mut warnings = Vec::new();
        for listing in listings {
            ctx.check_cancelled()?;
            match fetch_region(ctx, &listing).await {
                Ok(batch) => records.extend(batch),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => warnings.push(e),
            }
        }

        let records = retain_valid(records, self.id());
        if records.is_empty() {
            return Err(warnings.pop().unwrap_or(Error::RecordCountBelowFloor {
                expected: 1,
                got: 0,
            }));
        }
        Ok(DriverReport::new(self.id(), Some(PAGE_URL), records).with_warnings(warnings))
    }
}

/// Pull `(region, count, pdf link)` triples out of the aggregator page.
///
/// The count appears in the heading or intro text near each region's PDF
/// link ("Colleges in Scotland (24)"), so matching works on the page text
/// plus the anchor inventory rather than a brittle DOM path.
fn parse_region_listings(page: &str) -> Result<Vec<RegionListing>> {
    let doc = html::parse(page);
    let anchors = html::select_texts_with_attr(&doc, "a[href]", "href")?;
    let body_text = html::select_texts(&doc, "body")?.join(" ");

    let mut listings = Vec::new();
    for region in REGIONS {
        let count_pattern = Regex::new(&format!(r"(?i){region}\s*\((\d+)\)"))
            .map_err(|e| Error::Decode {
                format: "html",
                detail: e.to_string(),
            })?;
        let expected_count = count_pattern
            .captures(&body_text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok());

        let pdf_url = anchors
            .iter()
            .find(|(text, href)| {
                href.to_lowercase().ends_with(".pdf")
                    && text.to_lowercase().contains(&region.to_lowercase())
            })
            .map(|(_, href)| resolve_href(href));

        match (expected_count, pdf_url) {
            (Some(expected_count), Some(pdf_url)) => listings.push(RegionListing {
                region: (*region).to_string(),
                expected_count,
                pdf_url,
            }),
            _ => {
                return Err(Error::LinkDiscovery {
                    source_id: SourceId::Aoc.to_string(),
                    detail: format!("count or PDF link missing for {region}"),
                });
            }
        }
    }
    Ok(listings)
}

fn resolve_href(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("https://www.aoc.co.uk{href}")
    }
}

async fn fetch_region(ctx: &DriverContext, listing: &RegionListing) -> Result<Vec<Organisation>> {
    let payload = ctx.fetch(&listing.pdf_url).await?;
    ctx.check_cancelled()?;

    let lines = pdf::extract_lines(&payload.bytes)?;
    map_region(listing, college_names(&lines))
}

/// Validate the parsed count against the page-reported count, then map.
///
/// A mismatch is fatal for the region: emitting a silently short or long
/// list would defeat the whole point of the page advertising a count.
fn map_region(listing: &RegionListing, names: Vec<String>) -> Result<Vec<Organisation>> {
    if names.len() != listing.expected_count {
        return Err(Error::CountMismatch {
            region: listing.region.clone(),
            expected: listing.expected_count,
            got: names.len(),
        });
    }

    let provenance = source_ref(SourceId::Aoc, Some(listing.pdf_url.as_str()), 0.9);
    Ok(names
        .into_iter()
        .map(|name| {
            let mut record = base_record(
                slug_id("college-", &name),
                name,
                OrganisationType::EducationalInstitution,
                provenance.clone(),
            );
            record.classification = Some("Further education college".into());
            record.location = Some(Location {
                country: Some(listing.region.clone()),
                ..Location::default()
            });
            record
        })
        .collect())
}

/// Recover college names from the extracted PDF lines.
///
/// Membership PDFs are one college per line with headers, page numbers, and
/// footer furniture mixed in; a college line contains letters and is neither
/// a bare number nor a heading we recognise.
fn college_names(lines: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for line in lines {
        if line.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
            continue; // page numbers
        }
        let lower = line.to_lowercase();
        if lower.starts_with("colleges in")
            || lower.starts_with("list of")
            || lower.starts_with("association of colleges")
            || lower.starts_with("page ")
            || lower.starts_with("www.")
        {
            continue;
        }
        if !line.chars().any(char::is_alphabetic) {
            continue;
        }
        names.push(line.clone());
    }
    names
}
