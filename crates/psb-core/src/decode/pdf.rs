//! PDF text extraction.
//!
//! College membership lists arrive as PDF tables; all the drivers need back
//! is the line structure, so extraction returns trimmed non-empty lines.

use crate::{Error, Result};

/// Extract text lines from a PDF payload.
pub fn extract_lines(bytes: &[u8]) -> Result<Vec<String>> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Decode {
        format: "pdf",
        detail: e.to_string(),
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}
