//! Decoder capabilities shared by the source drivers.
//!
//! Each decoder turns a fetched payload into a shape a mapper can walk:
//! a JSON tree, CSV rows, workbook sheets, a queryable DOM, or text lines
//! recovered from a PDF. Decoders fail with [`crate::Error::Decode`]; the
//! calling driver decides whether that is fatal or a partial warning.

pub mod csv;
pub mod excel;
pub mod html;
pub mod json;
pub mod pdf;
