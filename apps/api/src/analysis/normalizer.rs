//! Response Normalizer — turns loosely formatted model output into a `CanonicalResult`.
//!
//! Both parsers are total. Anything that cannot be read degrades to defaults,
//! and when nothing at all can be read the raw text is carried through as
//! `Normalized::Degraded`.

use serde_json::{Map, Value};
use tracing::warn;

use crate::analysis::{CanonicalResult, Normalized};

const MATCH_PERCENTAGE: &str = "match_percentage";
const ATS_FRIENDLY_SCORE: &str = "ats_friendly_score";
const KEY_MATCHES: &str = "key_matches";
const MISSING_CRITICAL_REQUIREMENTS: &str = "missing_critical_requirements";
const OVERALL_ASSESSMENT: &str = "overall_assessment";

const MATCH_PERCENTAGE_MARKER: &str = "MATCH PERCENTAGE:";
const ATS_SCORE_MARKER: &str = "ATS SCORE:";
const KEY_MATCHES_MARKER: &str = "KEY MATCHES:";
const MISSING_REQUIREMENTS_MARKER: &str = "MISSING REQUIREMENTS:";
const OVERALL_ASSESSMENT_MARKER: &str = "OVERALL ASSESSMENT:";

// ────────────────────────────────────────────────────────────────────────────
// JSON-object format
// ────────────────────────────────────────────────────────────────────────────

/// Parses a response that should contain a single JSON object.
///
/// Leading or trailing prose around the object is ignored. Each canonical key
/// is coerced independently, so one bad field never discards the others.
pub fn parse_json_response(raw: &str) -> Normalized {
    let candidate = isolate_json_object(raw);

    let fields = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            warn!("AI response is JSON but not an object: {other}");
            return Normalized::Degraded {
                raw: candidate.to_string(),
            };
        }
        Err(e) => {
            warn!("Failed to parse AI response as JSON: {e}");
            return Normalized::Degraded {
                raw: candidate.to_string(),
            };
        }
    };

    Normalized::Parsed(canonical_from_fields(&fields))
}

/// Slices from the first `{` to the last `}` so commentary around the object is dropped.
fn isolate_json_object(raw: &str) -> &str {
    let text = raw.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn canonical_from_fields(fields: &Map<String, Value>) -> CanonicalResult {
    CanonicalResult {
        match_percentage: fields.get(MATCH_PERCENTAGE).map(coerce_score).unwrap_or(0),
        ats_friendly_score: fields.get(ATS_FRIENDLY_SCORE).map(coerce_score).unwrap_or(0),
        key_matches: fields.get(KEY_MATCHES).map(coerce_list).unwrap_or_default(),
        missing_critical_requirements: fields
            .get(MISSING_CRITICAL_REQUIREMENTS)
            .map(coerce_list)
            .unwrap_or_default(),
        overall_assessment: fields
            .get(OVERALL_ASSESSMENT)
            .map(coerce_text)
            .unwrap_or_default(),
    }
}

/// Float-then-truncate cast, clamped to 0–100. Unreadable values become 0.
fn coerce_score(value: &Value) -> u8 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .map(|n| n.trunc().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

/// Arrays keep their order; anything else becomes an empty list.
fn coerce_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section-marker format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    KeyMatches,
    MissingRequirements,
    Assessment,
}

/// Parses the line-oriented layout requested by the section-marker prompt.
///
/// Numeric markers never change the current section. List items are lines
/// starting with `- ` under a list section; every line under the assessment
/// section is appended to the assessment.
pub fn parse_structured_response(raw: &str) -> Normalized {
    let mut result = CanonicalResult::default();
    let mut assessment: Vec<&str> = Vec::new();
    let mut section: Option<Section> = None;
    let mut recognized = false;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix(MATCH_PERCENTAGE_MARKER) {
            recognized = true;
            if let Some(score) = parse_marker_score(rest) {
                result.match_percentage = score;
            }
        } else if let Some(rest) = line.strip_prefix(ATS_SCORE_MARKER) {
            recognized = true;
            if let Some(score) = parse_marker_score(rest) {
                result.ats_friendly_score = score;
            }
        } else if line == KEY_MATCHES_MARKER {
            recognized = true;
            section = Some(Section::KeyMatches);
        } else if line == MISSING_REQUIREMENTS_MARKER {
            recognized = true;
            section = Some(Section::MissingRequirements);
        } else if line == OVERALL_ASSESSMENT_MARKER {
            recognized = true;
            section = Some(Section::Assessment);
        } else {
            match section {
                Some(Section::KeyMatches) => {
                    if let Some(item) = line.strip_prefix("- ") {
                        result.key_matches.push(item.trim().to_string());
                    }
                }
                Some(Section::MissingRequirements) => {
                    if let Some(item) = line.strip_prefix("- ") {
                        result.missing_critical_requirements.push(item.trim().to_string());
                    }
                }
                Some(Section::Assessment) => assessment.push(line),
                None => {}
            }
        }
    }

    if !recognized {
        warn!("AI response contains no section markers");
        return Normalized::Degraded {
            raw: raw.trim().to_string(),
        };
    }

    result.overall_assessment = assessment.join("\n");
    Normalized::Parsed(result)
}

/// Reads the integer between the marker's colon and the next colon, clamped to 0–100.
fn parse_marker_score(rest: &str) -> Option<u8> {
    rest.split(':')
        .next()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, 100) as u8)
}
