//! Excel workbook decoding via `calamine`.
//!
//! Workbooks open from fetched bytes, sheets are addressed by name, and rows
//! are resolved against a header row located by scanning for the caller's
//! required columns (publisher workbooks put titles and notes above the real
//! header, so the first row cannot be trusted).

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::{Error, Result};

/// Rows above which the header must appear.
const HEADER_SCAN_LIMIT: usize = 20;

/// An open workbook.
pub struct Workbook {
    inner: Xlsx<Cursor<Vec<u8>>>,
}

impl Workbook {
    /// Open a workbook from fetched bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let inner = Xlsx::new(Cursor::new(bytes)).map_err(|e| Error::Decode {
            format: "xlsx",
            detail: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Names of every sheet in workbook order.
    #[must_use]
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names().to_vec()
    }

    /// Read a named sheet, locating the header row by the required columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the sheet is missing or no row within
    /// the scan window carries all of `required_columns`.
    pub fn sheet_with_headers(&mut self, name: &str, required_columns: &[&str]) -> Result<Sheet> {
        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|e| Error::Decode {
                format: "xlsx",
                detail: format!("sheet '{name}' unavailable: {e}"),
            })?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        let header_at = rows
            .iter()
            .take(HEADER_SCAN_LIMIT)
            .position(|row| {
                required_columns.iter().all(|required| {
                    row.iter()
                        .any(|cell| cell.eq_ignore_ascii_case(required.trim()))
                })
            })
            .ok_or_else(|| Error::Decode {
                format: "xlsx",
                detail: format!(
                    "sheet '{name}' has no header row with columns {required_columns:?}"
                ),
            })?;

        let mut index = HashMap::new();
        for (position, cell) in rows[header_at].iter().enumerate() {
            if !cell.is_empty() {
                index.entry(cell.to_lowercase()).or_insert(position);
            }
        }

        Ok(Sheet {
            index,
            rows: rows.into_iter().skip(header_at + 1).collect(),
        })
    }
}

/// A sheet resolved against its header row.
pub struct Sheet {
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Iterate data rows below the header.
    pub fn rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().map(|cells| SheetRow {
            index: &self.index,
            cells,
        })
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the sheet has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One data row of a [`Sheet`].
pub struct SheetRow<'s> {
    index: &'s HashMap<String, usize>,
    cells: &'s [String],
}

impl SheetRow<'_> {
    /// Cell under the named column; `None` when absent or blank.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        let position = *self.index.get(&column.trim().to_lowercase())?;
        self.cells
            .get(position)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}
