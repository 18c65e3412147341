//! Annotation records and normalization of raw persisted data.
//!
//! Buckets are persisted as JSON arrays written by potentially older versions
//! of the overlay, so everything read back is treated as untrusted:
//! [`normalize`] turns an arbitrary JSON value into a canonical in-memory
//! vector, dropping malformed records instead of failing the whole read.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed set of feedback categories selectable on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bug,
    Design,
    Content,
    Suggestion,
    Question,
    #[serde(other)]
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

/// Bounding box of the page element an annotation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A page-anchored feedback record.
///
/// Coordinates are document-relative, unless `is_fixed` is set in which case
/// they are viewport-relative (the marker tracks a fixed-position element).
/// `timestamp` is required and must be a finite number for the record to be
/// considered live; every other field has a defensive default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub element: String,
    #[serde(default)]
    pub element_path: String,
    /// Optional visual record as a data-URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_text: Option<String>,
    /// Computed-style snapshot captured at annotation time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Value>,
    /// Accessibility snapshot captured at annotation time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<Value>,
    /// Creation time in milliseconds; ordering and retention key.
    pub timestamp: f64,
}

/// Validate and de-duplicate a raw persisted value into canonical records.
///
/// - Non-array input yields an empty vector (defensive default, not an error).
/// - Elements without an object shape or a finite numeric `timestamp` are
///   dropped.
/// - Ids are trimmed; empty or duplicate ids are replaced with a synthesized
///   one, so id uniqueness holds within the output even for corrupt input.
/// - Input order is preserved for surviving elements.
pub fn normalize(raw: &Value) -> Vec<Annotation> {
    let items = match raw.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            continue;
        }
        let ts = match item.get("timestamp").and_then(Value::as_f64) {
            Some(ts) if ts.is_finite() => ts,
            _ => continue,
        };
        let mut annotation: Annotation = match serde_json::from_value(item.clone()) {
            Ok(a) => a,
            Err(_) => continue,
        };
        annotation.timestamp = ts;

        let trimmed = annotation.id.trim().to_string();
        annotation.id = if trimmed.is_empty() || seen.contains(&trimmed) {
            fresh_id(index)
        } else {
            trimmed
        };
        seen.insert(annotation.id.clone());
        out.push(annotation);
    }
    out
}

/// Synthesize a bucket-unique id from current time, a random suffix, and the
/// record's position in the input.
fn fresh_id(index: usize) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{:08x}-{}", crate::now_ms(), suffix, index)
}
