//! Markdown code fence removal for model output
//!
//! Models asked for JSON sometimes wrap it in a fenced block, with or without
//! a language tag. Text without a fence is returned trimmed.

const FENCE: &str = "```";

/// Return the content of a fenced block, or the trimmed input when there is
/// no opening fence
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // language tag, e.g. "json"
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.strip_suffix(FENCE).unwrap_or(rest);
    rest.trim()
}
