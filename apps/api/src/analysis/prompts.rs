// Prompt templates for resume analysis.
// Each template has exactly two substitution points: {job_description} and {resume_text}.

use crate::llm_client::prompts::{ATS_ROLE, FOLLOW_FORMAT_INSTRUCTION, JSON_ONLY_INSTRUCTION};

const JOB_DESCRIPTION_SLOT: &str = "{job_description}";
const RESUME_TEXT_SLOT: &str = "{resume_text}";

/// System prompt for the JSON strategy.
pub fn json_system_prompt() -> String {
    format!("{ATS_ROLE} Analyze the resume against the job description. {JSON_ONLY_INSTRUCTION}")
}

/// System prompt for the section-marker strategy.
pub fn sections_system_prompt() -> String {
    FOLLOW_FORMAT_INSTRUCTION.to_string()
}

/// JSON analysis template.
pub const JSON_ANALYSIS_TEMPLATE: &str = r#"You are an expert ATS (Applicant Tracking System) analyzer. Analyze the resume against the job description.

Job Description:
{job_description}

Resume Content:
{resume_text}

Return a JSON object with this EXACT schema (no extra fields):
{
    "match_percentage": <integer 0-100, overall match between the resume and the job description>,
    "ats_friendly_score": <integer 0-100, how well the resume format parses in an ATS>,
    "key_matches": ["<matching skill or qualification>"],
    "missing_critical_requirements": ["<important requirement the resume does not show>"],
    "overall_assessment": "<detailed paragraph about overall fit>"
}

Remember: your response must be ONLY the JSON object, nothing else."#;

/// Section-marker analysis template.
pub const SECTIONS_ANALYSIS_TEMPLATE: &str = r#"You are an expert ATS (Applicant Tracking System) analyzer. Analyze the resume against the job description.

Job Description:
{job_description}

Resume Text:
{resume_text}

Respond using EXACTLY this layout. Each marker must start its own line:

MATCH PERCENTAGE: <integer 0-100>
ATS SCORE: <integer 0-100>
KEY MATCHES:
- <matching skill or qualification>
MISSING REQUIREMENTS:
- <important requirement the resume does not show>
OVERALL ASSESSMENT:
<detailed paragraph about overall fit>"#;

/// Fills both slots of `template` in a single pass.
///
/// Slot markers that appear inside the substituted text are left untouched.
pub fn build(template: &str, job_description: &str, resume_text: &str) -> String {
    let mut out =
        String::with_capacity(template.len() + job_description.len() + resume_text.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix(JOB_DESCRIPTION_SLOT) {
            out.push_str(job_description);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(RESUME_TEXT_SLOT) {
            out.push_str(resume_text);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
