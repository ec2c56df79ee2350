//! Composite courts driver: England & Wales CSV, Northern Ireland HTML, and
//! the Scottish directory with an embedded fallback.
//!
//! Each jurisdiction is a sub-pipeline with its own floor. A sub-pipeline
//! failure becomes a partial warning; the driver fails only when no
//! jurisdiction yields records. The Scottish sub-pipeline falls back to an
//! embedded dataset when the live fetch fails at the network level, and those
//! records are flagged `dataQuality.source = fallback`.

use async_trait::async_trait;

use crate::decode::{csv, html};
use crate::driver::{
    Driver, DriverContext, DriverReport, base_record, enforce_floor, retain_valid, slug_id,
    source_ref,
};
use crate::model::{
    Coordinates, DataOrigin, DataQuality, Location, Organisation, OrganisationType, SourceId,
    Status,
};
use crate::{Error, Result};

const EW_CSV_URL: &str = "https://factprod.blob.core.windows.net/csv/courts-and-tribunals-data.csv";
const NI_URL: &str =
    "https://www.justice-ni.gov.uk/topics/courts-and-tribunals/court-and-tribunal-contact-details";
const SCOTTISH_URL: &str =
    "https://www.scotcourts.gov.uk/courts-and-tribunals/courts-tribunals-and-office-locations";

const EW_FLOOR: usize = 300;
const NI_FLOOR: usize = 15;
const SCOTTISH_FLOOR: usize = 30;

/// Scottish courts embedded as a fallback for when the live directory is
/// unreachable. Supreme courts first, then sheriff courts by town, then
/// justice of the peace courts that share no sheriff court building.
const SCOTTISH_FALLBACK: &[&str] = &[
    "Court of Session",
    "High Court of Justiciary",
    "Sheriff Appeal Court",
    "Aberdeen Sheriff Court and Justice of the Peace Court",
    "Airdrie Sheriff Court and Justice of the Peace Court",
    "Alloa Sheriff Court and Justice of the Peace Court",
    "Ayr Sheriff Court and Justice of the Peace Court",
    "Banff Sheriff Court and Justice of the Peace Court",
    "Campbeltown Sheriff Court and Justice of the Peace Court",
    "Dumbarton Sheriff Court and Justice of the Peace Court",
    "Dumfries Sheriff Court and Justice of the Peace Court",
    "Dundee Sheriff Court and Justice of the Peace Court",
    "Dunfermline Sheriff Court and Justice of the Peace Court",
    "Dunoon Sheriff Court and Justice of the Peace Court",
    "Edinburgh Sheriff Court and Justice of the Peace Court",
    "Elgin Sheriff Court and Justice of the Peace Court",
    "Falkirk Sheriff Court and Justice of the Peace Court",
    "Forfar Sheriff Court and Justice of the Peace Court",
    "Fort William Sheriff Court and Justice of the Peace Court",
    "Glasgow Sheriff Court and Justice of the Peace Court",
    "Greenock Sheriff Court and Justice of the Peace Court",
    "Hamilton Sheriff Court and Justice of the Peace Court",
    "Inverness Justice Centre",
    "Jedburgh Sheriff Court and Justice of the Peace Court",
    "Kilmarnock Sheriff Court and Justice of the Peace Court",
    "Kirkcaldy Sheriff Court and Justice of the Peace Court",
    "Kirkwall Sheriff Court and Justice of the Peace Court",
    "Lanark Sheriff Court and Justice of the Peace Court",
    "Lerwick Sheriff Court and Justice of the Peace Court",
    "Livingston Sheriff Court and Justice of the Peace Court",
    "Lochgilphead Sheriff Court and Justice of the Peace Court",
    "Lochmaddy Sheriff Court and Justice of the Peace Court",
    "Oban Sheriff Court and Justice of the Peace Court",
    "Paisley Sheriff Court and Justice of the Peace Court",
    "Perth Sheriff Court and Justice of the Peace Court",
    "Peterhead Sheriff Court and Justice of the Peace Court",
    "Portree Sheriff Court and Justice of the Peace Court",
    "Selkirk Sheriff Court and Justice of the Peace Court",
    "Stirling Sheriff Court and Justice of the Peace Court",
    "Stornoway Sheriff Court and Justice of the Peace Court",
    "Stranraer Sheriff Court and Justice of the Peace Court",
    "Tain Sheriff Court and Justice of the Peace Court",
    "Wick Sheriff Court and Justice of the Peace Court",
];

/// Composite driver over the three courts sub-sources.
pub struct CourtsDriver;

#[async_trait]
impl Driver for CourtsDriver {
    fn id(&self) -> SourceId {
        SourceId::UkCourtsCsv
    }

    fn filter_aliases(&self) -> &'static [&'static str] {
        &[
            "courts",
            "uk_courts",
            "uk_courts_csv",
            "ni_courts",
            "scottish_courts",
        ]
    }

    fn description(&self) -> &'static str {
        "Courts of England & Wales, Northern Ireland, and Scotland"
    }

    async fn fetch_and_map(&self, ctx: &DriverContext) -> Result<DriverReport> {
        let mut records = Vec::new();
        let mut warnings = Vec::new();

        match england_wales(ctx).await {
            Ok(batch) => records.extend(batch),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => warnings.push(e),
        }
        match northern_ireland(ctx).await {
            Ok(batch) => records.extend(batch),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => warnings.push(e),
        }
        match scotland(ctx, &mut warnings).await {
            Ok(batch) => records.extend(batch),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => warnings.push(e),
        }

        if records.is_empty() {
            return Err(warnings.pop().unwrap_or(Error::RecordCountBelowFloor {
                expected: 1,
                got: 0,
            }));
        }
        Ok(DriverReport::new(self.id(), Some(EW_CSV_URL), records).with_warnings(warnings))
    }
}

async fn england_wales(ctx: &DriverContext) -> Result<Vec<Organisation>> {
    let payload = ctx.fetch_accept(EW_CSV_URL, "text/csv").await?;
    ctx.check_cancelled()?;

    let provenance = source_ref(SourceId::UkCourtsCsv, Some(EW_CSV_URL), 1.0);
    let mut records = Vec::new();
    let headers = csv::for_each_row(&payload.bytes, |_, row| {
        let Some(name) = row.get("name") else {
            return Ok(());
        };
        let mut record = base_record(
            slug_id("court-ew-", name),
            name.to_string(),
            OrganisationType::Court,
            provenance.clone(),
        );
        record.classification = row.get("types").map(ToString::to_string);
        if row.get("open").is_some_and(|open| open.eq_ignore_ascii_case("false")) {
            record.status = Status::Dissolved;
        }
        let coordinates = match (row.get("lat"), row.get("lon")) {
            (Some(lat), Some(lon)) => match (lat.parse::<f64>(), lon.parse::<f64>()) {
                (Ok(latitude), Ok(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            },
            _ => None,
        };
        // The extract spans England and Wales with no per-row nation column;
        // country stays unset rather than guessing.
        record.location = coordinates.map(|coordinates| Location {
            coordinates: Some(coordinates),
            ..Location::default()
        });
        records.push(record);
        Ok(())
    })?;

    if !headers.contains_all(&["name"]) {
        return Err(Error::StructureChanged {
            source_id: SourceId::UkCourtsCsv.to_string(),
            detail: "name column missing from courts CSV".into(),
        });
    }

    let records = retain_valid(records, SourceId::UkCourtsCsv);
    enforce_floor(&records, EW_FLOOR)?;
    Ok(records)
}

async fn northern_ireland(ctx: &DriverContext) -> Result<Vec<Organisation>> {
    let text = ctx.fetch(NI_URL).await?.text();
    ctx.check_cancelled()?;

    let names = {
        let doc = html::parse(&text);
        html::require_texts(
            &doc,
            ".page-content ul li a, article ul li a",
            SourceId::NiCourts.as_str(),
        )?
    };

    let provenance = source_ref(SourceId::NiCourts, Some(NI_URL), 0.9);
    let records: Vec<_> = names
        .into_iter()
        .map(|name| {
            let mut record = base_record(
                slug_id("court-ni-", &name),
                name,
                OrganisationType::Court,
                provenance.clone(),
            );
            record.location = Some(Location {
                country: Some("Northern Ireland".into()),
                ..Location::default()
            });
            record
        })
        .collect();

    let records = retain_valid(records, SourceId::NiCourts);
    enforce_floor(&records, NI_FLOOR)?;
    Ok(records)
}

async fn scotland(ctx: &DriverContext, warnings: &mut Vec<Error>) -> Result<Vec<Organisation>> {
    match live_scottish(ctx).await {
        Ok(records) => Ok(records),
        // Network-level failures fall back to the embedded list; a changed
        // page shape does not, because stale fallback data would mask it.
        Err(e @ (Error::Timeout { .. } | Error::Transport { .. } | Error::HttpStatus { .. })) => {
            warnings.push(e);
            let names = SCOTTISH_FALLBACK.iter().map(ToString::to_string).collect();
            Ok(map_scottish(names, DataOrigin::Fallback))
        }
        Err(e) => Err(e),
    }
}

async fn live_scottish(ctx: &DriverContext) -> Result<Vec<Organisation>> {
    let text = ctx.fetch(SCOTTISH_URL).await?.text();
    ctx.check_cancelled()?;

    let names = {
        let doc = html::parse(&text);
        html::require_texts(
            &doc,
            ".locations-list li a, .court-locations li a",
            SourceId::ScottishCourts.as_str(),
        )?
    };
    let records = map_scottish(names, DataOrigin::Live);
    enforce_floor(&records, SCOTTISH_FLOOR)?;
    Ok(records)
}

fn map_scottish(names: Vec<String>, origin: DataOrigin) -> Vec<Organisation> {
    let confidence = if origin == DataOrigin::Fallback { 0.7 } else { 0.9 };
    let provenance = source_ref(SourceId::ScottishCourts, Some(SCOTTISH_URL), confidence);
    let records: Vec<_> = names
        .into_iter()
        .map(|name| {
            let mut record = base_record(
                slug_id("court-scot-", &name),
                name,
                OrganisationType::Court,
                provenance.clone(),
            );
            record.location = Some(Location {
                country: Some("Scotland".into()),
                ..Location::default()
            });
            if origin == DataOrigin::Fallback {
                record.data_quality = Some(DataQuality {
                    completeness: record.completeness(),
                    source: DataOrigin::Fallback,
                });
            }
            record
        })
        .collect();
    retain_valid(records, SourceId::ScottishCourts)
}
