//! Response normalisation: turn model text into artifact content.
//!
//! Transcriptions pass through untouched. Entity responses go through two
//! small steps so each can be tested on its own:
//!
//! 1. [`unwrap_json_fence`]: models are told not to fence their JSON but
//!    sometimes do anyway; keep only the interior of a `` ```json `` block.
//! 2. [`parse_entities`]: deserialize against [`EntityAnnotations`].
//!
//! What happens when step 2 fails is the run's
//! [`ParseFailurePolicy`](crate::config::ParseFailurePolicy).

use crate::config::{ParseFailurePolicy, PipelineKind};
use crate::entities::{EntityAnnotations, ParseFailureRecord};
use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// What gets written for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactContent {
    /// Raw transcription text.
    Text(String),
    /// Parsed entities.
    Entities(EntityAnnotations),
    /// The entity response did not parse; raw text kept for inspection.
    ParseFailure(ParseFailureRecord),
}

impl ArtifactContent {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ArtifactContent::ParseFailure(_))
    }

    /// File bytes: text as-is, JSON pretty-printed with 4-space indentation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ArtifactContent::Text(text) => Ok(text.as_bytes().to_vec()),
            ArtifactContent::Entities(entities) => to_pretty_json(entities),
            ArtifactContent::ParseFailure(record) => to_pretty_json(record),
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```\s*json(.*?)\s*```").unwrap());

/// Return the trimmed interior of the first `` ```json `` fence, or the
/// trimmed text when there is none. The marker match is case-insensitive.
pub fn unwrap_json_fence(text: &str) -> &str {
    match RE_JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(interior) => interior.as_str().trim(),
        None => text.trim(),
    }
}

/// Parse entity JSON, fenced or not.
pub fn parse_entities(text: &str) -> Result<EntityAnnotations, ParseError> {
    serde_json::from_str(unwrap_json_fence(text)).map_err(|e| ParseError {
        reason: e.to_string(),
    })
}

/// Normalise one response for the given pipeline.
///
/// `Err` only in entity mode under [`ParseFailurePolicy::SkipPage`].
pub fn normalize(
    kind: PipelineKind,
    text: &str,
    policy: ParseFailurePolicy,
) -> Result<ArtifactContent, ParseError> {
    match kind {
        PipelineKind::Transcribe => Ok(ArtifactContent::Text(text.to_string())),
        PipelineKind::ExtractEntities => match parse_entities(text) {
            Ok(entities) => Ok(ArtifactContent::Entities(entities)),
            Err(e) => match policy {
                ParseFailurePolicy::FallbackRecord => {
                    Ok(ArtifactContent::ParseFailure(ParseFailureRecord {
                        error: e.to_string(),
                        raw_text: text.to_string(),
                    }))
                }
                ParseFailurePolicy::SkipPage => Err(e),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"persons": [], "places": [{"name": "Feldkirch", "normalized": null, "geo": {"lat": null, "lon": null}, "mentions": [{"start": 3, "end": 12}], "confidence": 0.95}], "content": [{"denomination": null, "eco": "Volkswirtschaft"}]}"#;

    #[test]
    fn fenced_json_parses_like_its_interior() {
        let fenced = format!("Hier ist das Ergebnis:\n```json\n{BARE}\n```\nEnde.");
        assert_eq!(parse_entities(&fenced).unwrap(), parse_entities(BARE).unwrap());
    }

    #[test]
    fn fence_marker_is_case_insensitive() {
        let fenced = format!("```JSON\n{BARE}\n```");
        assert_eq!(unwrap_json_fence(&fenced), BARE);
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        let padded = format!("\n\n  {BARE}  \n");
        assert_eq!(unwrap_json_fence(&padded), BARE);
        assert!(parse_entities(&padded).is_ok());
    }

    #[test]
    fn plain_fence_without_marker_is_not_unwrapped() {
        let fenced = format!("```\n{BARE}\n```");
        assert_eq!(unwrap_json_fence(&fenced), fenced.trim());
        assert!(parse_entities(&fenced).is_err());
    }

    #[test]
    fn transcription_passes_through_unchanged() {
        let text = "  Aufruf an das Schweizervolk!\n\n```json\n{}\n```  ";
        let content = normalize(
            PipelineKind::Transcribe,
            text,
            ParseFailurePolicy::SkipPage,
        )
        .unwrap();
        assert_eq!(content, ArtifactContent::Text(text.to_string()));
        assert_eq!(content.to_bytes().unwrap(), text.as_bytes());
    }

    #[test]
    fn empty_transcription_is_empty_text() {
        let content =
            normalize(PipelineKind::Transcribe, "", ParseFailurePolicy::default()).unwrap();
        assert_eq!(content.to_bytes().unwrap(), b"");
    }

    #[test]
    fn invalid_json_becomes_fallback_record() {
        let raw = "Ich konnte keine Entitäten finden.";
        let content = normalize(
            PipelineKind::ExtractEntities,
            raw,
            ParseFailurePolicy::FallbackRecord,
        )
        .unwrap();
        assert!(content.is_fallback());

        let json: serde_json::Value = serde_json::from_slice(&content.to_bytes().unwrap()).unwrap();
        assert_eq!(json["raw_text"], raw);
        assert!(json["error"].as_str().unwrap().contains("not valid entity JSON"));
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn invalid_json_is_an_error_when_skipping() {
        let err = normalize(
            PipelineKind::ExtractEntities,
            "{\"persons\": [",
            ParseFailurePolicy::SkipPage,
        )
        .unwrap_err();
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn schema_violation_counts_as_parse_failure() {
        let err = parse_entities(r#"{"persons": [], "places": []}"#).unwrap_err();
        assert!(err.reason.contains("content"), "got: {}", err.reason);
    }

    #[test]
    fn entity_json_uses_four_space_indent_and_keeps_umlauts() {
        let content = normalize(
            PipelineKind::ExtractEntities,
            r#"{"persons": [], "places": [{"name": "Zürich", "normalized": null, "confidence": 1.0}], "content": []}"#,
            ParseFailurePolicy::FallbackRecord,
        )
        .unwrap();
        let text = String::from_utf8(content.to_bytes().unwrap()).unwrap();
        assert!(text.contains("\n    \"persons\": []"), "got: {text}");
        assert!(text.contains("Zürich"));
        assert!(text.contains("\"normalized\": null"));
    }
}
