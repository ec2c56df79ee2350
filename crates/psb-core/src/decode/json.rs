//! JSON decoding and tree access.
//!
//! External payloads are parsed into untyped [`serde_json::Value`] trees and
//! read with dotted-path selectors, so each mapper is a flat declaration of
//! the fields it consumes instead of a nest of manual `match`es.

use serde_json::Value;

use crate::{Error, Result};

/// Parse a JSON payload into an untyped tree.
pub fn parse(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode {
        format: "json",
        detail: e.to_string(),
    })
}

/// Walk a dotted path through objects and arrays.
///
/// Path segments are object keys, except segments that parse as an integer
/// when the current node is an array: `"results.0.title"`.
#[must_use]
pub fn select<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String at `path`, trimmed, `None` when absent, non-string, or blank.
#[must_use]
pub fn select_str<'a>(root: &'a Value, path: &str) -> Option<&'a str> {
    select(root, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Array at `path`, or an empty slice when absent.
#[must_use]
pub fn select_array<'a>(root: &'a Value, path: &str) -> &'a [Value] {
    select(root, path)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// One declared field of a mapper: where it lives in the raw tree, whether
/// its absence is an error, and an optional in-place transform.
pub struct FieldExtractor {
    path: &'static str,
    required: bool,
    transform: Option<fn(&str) -> String>,
}

impl FieldExtractor {
    /// Field that may be absent.
    #[must_use]
    pub const fn optional(path: &'static str) -> Self {
        Self {
            path,
            required: false,
            transform: None,
        }
    }

    /// Field whose absence fails the record.
    #[must_use]
    pub const fn required(path: &'static str) -> Self {
        Self {
            path,
            required: true,
            transform: None,
        }
    }

    /// Apply a transform to the extracted string.
    #[must_use]
    pub const fn map(mut self, transform: fn(&str) -> String) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Extract from a raw tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a required field is missing.
    pub fn extract(&self, raw: &Value) -> Result<Option<String>> {
        match select_str(raw, self.path) {
            Some(value) => Ok(Some(
                self.transform
                    .map_or_else(|| value.to_string(), |t| t(value)),
            )),
            None if self.required => Err(self.missing()),
            None => Ok(None),
        }
    }

    /// Extract a field that must be present, regardless of how the
    /// extractor was declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the field is absent.
    pub fn extract_required(&self, raw: &Value) -> Result<String> {
        self.extract(raw)?.ok_or_else(|| self.missing())
    }

    fn missing(&self) -> Error {
        Error::Validation {
            field: "raw",
            rule: format!("required field '{}' missing from payload", self.path),
        }
    }
}
