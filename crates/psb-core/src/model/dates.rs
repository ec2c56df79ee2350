//! Date parsing for the handful of formats sources actually emit.

use chrono::NaiveDate;

/// Parse a source-reported date.
///
/// Accepts ISO-8601 (`YYYY-MM-DD`, with or without a time suffix),
/// `DD/MM/YYYY`, `DD-MM-YYYY`, and a bare year (mapped to 1 January).
/// Anything else yields `None` rather than a partial guess.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // ISO timestamps: keep only the date part.
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%d-%m-%Y") {
        return Some(date);
    }
    if date_part.len() == 4 && date_part.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = date_part.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}
