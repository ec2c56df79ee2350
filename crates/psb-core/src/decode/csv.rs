//! CSV decoding with header mapping and streaming row iteration.

use std::collections::HashMap;
use std::io::Cursor;

use csv::ReaderBuilder;

use crate::{Error, Result};

/// A parsed header row: column name to position, first occurrence wins.
#[derive(Debug, Clone)]
pub struct Headers {
    index: HashMap<String, usize>,
}

impl Headers {
    /// Position of a column by case-insensitive name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.trim().to_lowercase()).copied()
    }

    /// True when every named column is present.
    #[must_use]
    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.position(n).is_some())
    }

    /// First column whose lowercased name ends with `suffix`.
    ///
    /// Geography extracts version their columns (`UTLA23CD`, `UTLA24CD`), so
    /// callers match on the stable suffix rather than the full name.
    #[must_use]
    pub fn find_by_suffix(&self, suffix: &str) -> Option<&str> {
        let suffix = suffix.to_lowercase();
        self.index
            .keys()
            .filter(|name| name.ends_with(&suffix))
            .min_by_key(|name| self.index[*name])
            .map(String::as_str)
    }
}

/// One data row, resolved against the header.
#[derive(Debug)]
pub struct Row<'h> {
    headers: &'h Headers,
    record: csv::StringRecord,
}

impl Row<'_> {
    /// Trimmed cell under the named column; `None` when the column is absent
    /// or the cell is blank.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        let position = self.headers.position(column)?;
        self.record
            .get(position)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Stream rows of a CSV payload through a callback.
///
/// The payload is decoded row by row so large files (the GIAS extract runs to
/// tens of thousands of rows) are never materialised twice. Quoted fields and
/// embedded newlines are handled by the underlying reader; the first row is
/// the header.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the payload has no header row or a data
/// row is unreadable, and propagates the first error the callback returns.
pub fn for_each_row<F>(bytes: &[u8], mut visit: F) -> Result<Headers>
where
    F: FnMut(&Headers, &Row<'_>) -> Result<()>,
{
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(bytes));

    let header_record = reader.headers().map_err(decode_err)?.clone();
    if header_record.is_empty() {
        return Err(Error::Decode {
            format: "csv",
            detail: "payload has no header row".into(),
        });
    }
    let mut index = HashMap::new();
    for (position, name) in header_record.iter().enumerate() {
        index
            .entry(name.trim().to_lowercase())
            .or_insert(position);
    }
    let headers = Headers { index };

    for record in reader.records() {
        let record = record.map_err(decode_err)?;
        let row = Row {
            headers: &headers,
            record,
        };
        visit(&headers, &row)?;
    }
    Ok(headers)
}

fn decode_err(e: csv::Error) -> Error {
    Error::Decode {
        format: "csv",
        detail: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_by_header_name() {
        let payload = b"Name,Town,Status\nMaidstone Crown Court,Maidstone,open\nShire Hall,Cambridge,\n";
        let mut names = Vec::new();
        let headers = for_each_row(payload, |_, row| {
            names.push((
                row.get("name").unwrap_or_default().to_string(),
                row.get("Status").map(ToString::to_string),
            ));
            Ok(())
        })
        .unwrap();

        assert!(headers.contains_all(&["Name", "Town", "Status"]));
        assert_eq!(
            names,
            vec![
                ("Maidstone Crown Court".to_string(), Some("open".to_string())),
                ("Shire Hall".to_string(), None),
            ]
        );
    }

    #[test]
    fn handles_quoted_fields_and_embedded_newlines() {
        let payload = b"name,address\n\"Court, The\",\"1 High Street\nTown\"\n";
        let mut seen = Vec::new();
        for_each_row(payload, |_, row| {
            seen.push((
                row.get("name").unwrap().to_string(),
                row.get("address").unwrap().to_string(),
            ));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen[0].0, "Court, The");
        assert!(seen[0].1.contains('\n'));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let payload = b"EstablishmentName,URN\nSt Mary's Primary,100001\n";
        for_each_row(payload, |headers, row| {
            assert_eq!(headers.position("establishmentname"), Some(0));
            assert_eq!(row.get("urn"), Some("100001"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn suffix_lookup_finds_versioned_geography_columns() {
        let payload = b"UTLA23CD,UTLA23NM\nE06000001,Hartlepool\n";
        for_each_row(payload, |headers, row| {
            let code_col = headers.find_by_suffix("cd").unwrap().to_string();
            let name_col = headers.find_by_suffix("nm").unwrap().to_string();
            assert_eq!(row.get(&code_col), Some("E06000001"));
            assert_eq!(row.get(&name_col), Some("Hartlepool"));
            assert!(headers.find_by_suffix("xx").is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn callback_errors_propagate() {
        let payload = b"name\nFirst\nSecond\n";
        let result = for_each_row(payload, |_, row| {
            if row.get("name") == Some("Second") {
                Err(Error::Validation {
                    field: "name",
                    rule: "rejected".into(),
                })
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
    }
}
