//! HTML decoding with CSS-selector access.
//!
//! Parsing is tolerant (real directory pages are rarely valid HTML), but
//! *absence* is strict: drivers ask for their expected container up front and
//! treat an empty selection as a structural change, never as zero rows.
//!
//! `scraper`'s DOM is not `Send`, so these helpers are synchronous and return
//! owned strings; drivers parse after the fetch completes and never hold a
//! document across an await point.

use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// Compile a CSS selector.
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Decode {
        format: "html",
        detail: format!("invalid selector '{css}': {e}"),
    })
}

/// Parse a document. Malformed input yields a best-effort tree.
#[must_use]
pub fn parse(text: &str) -> Html {
    Html::parse_document(text)
}

/// Collapsed inner text of an element: whitespace runs become single spaces.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collect the collapsed text of every match, skipping blanks.
pub fn select_texts(doc: &Html, css: &str) -> Result<Vec<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect())
}

/// Collect an attribute from every match, skipping elements without it.
pub fn select_attrs(doc: &Html, css: &str, attr: &str) -> Result<Vec<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Collect `(text, attr)` pairs from every match carrying the attribute.
pub fn select_texts_with_attr(doc: &Html, css: &str, attr: &str) -> Result<Vec<(String, String)>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .filter_map(|el| {
            let value = el.value().attr(attr)?.trim().to_string();
            let text = text_of(el);
            (!text.is_empty() && !value.is_empty()).then_some((text, value))
        })
        .collect())
}

/// Like [`select_texts`], but an empty selection is a structural failure.
///
/// # Errors
///
/// Returns [`Error::StructureChanged`] naming `source` when nothing matches.
pub fn require_texts(doc: &Html, css: &str, source: &str) -> Result<Vec<String>> {
    let found = select_texts(doc, css)?;
    if found.is_empty() {
        return Err(Error::StructureChanged {
            source_id: source.to_string(),
            detail: format!("no elements matched '{css}'"),
        });
    }
    Ok(found)
}
