// Shared prompt fragments used across analysis strategies.
// Each strategy owns its full template in analysis/prompts.rs.

/// Role instruction shared by every analysis prompt.
pub const ATS_ROLE: &str = "You are an expert ATS (Applicant Tracking System) analyzer.";

/// Instruction that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "IMPORTANT: Your response must be valid JSON. \
    Do not include any text before or after the JSON. \
    Do NOT use markdown code fences.";

/// Instruction that enforces the section-marker layout.
pub const FOLLOW_FORMAT_INSTRUCTION: &str =
    "You are a resume analyzer. Follow the format exactly as requested.";
