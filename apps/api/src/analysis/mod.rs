//! Resume analysis: prompt synthesis and normalization of model output.
//!
//! Two response formats exist: a JSON object and a line-oriented section-marker
//! layout. Each is paired with the prompt that asks for it, and the caller picks
//! one explicitly through `AnalysisStrategy`. There is no fallback between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod normalizer;
pub mod prompts;

/// The fixed, fully-typed verdict for one resume.
///
/// Always complete: missing or mistyped upstream fields fall back to
/// `0` / empty list / empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub match_percentage: u8,         // 0 – 100
    pub ats_friendly_score: u8,       // 0 – 100
    pub key_matches: Vec<String>,
    pub missing_critical_requirements: Vec<String>,
    pub overall_assessment: String,
}

/// Outcome of normalizing raw model text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The response followed the requested format closely enough to read fields from it.
    Parsed(CanonicalResult),
    /// Nothing usable could be read; the raw text is kept for the assessment.
    Degraded { raw: String },
}

impl Normalized {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Normalized::Degraded { .. })
    }

    /// Collapses either outcome into a complete `CanonicalResult`.
    pub fn into_result(self) -> CanonicalResult {
        match self {
            Normalized::Parsed(result) => result,
            Normalized::Degraded { raw } => CanonicalResult {
                overall_assessment: raw,
                ..CanonicalResult::default()
            },
        }
    }
}

/// Selects the prompt template and the matching response parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisStrategy {
    /// JSON-schema prompt, parsed by locating and decoding the JSON object.
    #[default]
    Json,
    /// Section-marker prompt (`MATCH PERCENTAGE:` etc.), parsed line by line.
    Sections,
}

impl AnalysisStrategy {
    pub fn name(self) -> &'static str {
        match self {
            AnalysisStrategy::Json => "json",
            AnalysisStrategy::Sections => "sections",
        }
    }

    pub fn system_prompt(self) -> String {
        match self {
            AnalysisStrategy::Json => prompts::json_system_prompt(),
            AnalysisStrategy::Sections => prompts::sections_system_prompt(),
        }
    }

    pub fn build_prompt(self, job_description: &str, resume_text: &str) -> String {
        let template = match self {
            AnalysisStrategy::Json => prompts::JSON_ANALYSIS_TEMPLATE,
            AnalysisStrategy::Sections => prompts::SECTIONS_ANALYSIS_TEMPLATE,
        };
        prompts::build(template, job_description, resume_text)
    }

    pub fn normalize(self, raw: &str) -> Normalized {
        match self {
            AnalysisStrategy::Json => normalizer::parse_json_response(raw),
            AnalysisStrategy::Sections => normalizer::parse_structured_response(raw),
        }
    }
}

impl fmt::Display for AnalysisStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown analysis strategy '{0}' (expected 'json' or 'sections')")]
pub struct ParseStrategyError(String);

impl FromStr for AnalysisStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(AnalysisStrategy::Json),
            "sections" => Ok(AnalysisStrategy::Sections),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}
