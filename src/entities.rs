//! The entity-extraction output schema.
//!
//! Parsing a model response into [`EntityAnnotations`] is the schema check:
//! the three top-level keys are mandatory and unknown keys are rejected at
//! every level. `honorifics` and `mentions` may be omitted (treated as
//! empty); nullable fields map to `Option`.

use serde::{Deserialize, Serialize};

/// Entities found on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityAnnotations {
    pub persons: Vec<Person>,
    pub places: Vec<Place>,
    pub content: Vec<ContentMention>,
}

/// A person, with every occurrence on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Person {
    /// Spelling exactly as printed.
    pub name: String,
    /// Modern or canonical form, when the model is confident.
    pub normalized: Option<String>,
    #[serde(default)]
    pub honorifics: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    pub confidence: f64,
}

/// A toponym, with optional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Place {
    pub name: String,
    pub normalized: Option<String>,
    #[serde(default)]
    pub geo: GeoPoint,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Character offsets into the page text; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mention {
    pub start: i64,
    pub end: i64,
}

/// Confessional and economic vocabulary noticed on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentMention {
    pub denomination: Option<String>,
    pub eco: Option<String>,
}

/// Written in place of [`EntityAnnotations`] when the response did not parse
/// and the run keeps fallback records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseFailureRecord {
    pub error: String,
    pub raw_text: String,
}
