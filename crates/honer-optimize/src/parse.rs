use honer_core::OptimizationResult;

pub const SCRATCHPAD_TAG: &str = "scratchpad";
pub const ANALYSIS_TAG: &str = "analysis";
pub const OPTIMIZED_PROMPT_TAG: &str = "optimized_prompt";
pub const KEY_IMPROVEMENTS_TAG: &str = "key_improvements";

/// Return the trimmed text between the first `<tag>` and the first `</tag>`
/// after it, matching the tag name case-insensitively.
///
/// Never fails: a missing or unclosed section yields an empty string. The
/// inner text may span lines and contain other angle-bracket markup.
pub fn extract_tag(text: &str, tag: &str) -> String {
    let open = format!("<{}>", tag.to_ascii_lowercase());
    let close = format!("</{}>", tag.to_ascii_lowercase());

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();

    let start = match lower.find(&open) {
        Some(i) => i + open.len(),
        None => return String::new(),
    };
    let end = match lower[start..].find(&close) {
        Some(len) => start + len,
        None => return String::new(),
    };

    text[start..end].trim().to_string()
}

/// Parse raw model output into the four sections, each independently.
/// A reply with no recognizable sections gives an all-empty result.
pub fn parse_llm_output(raw: &str) -> OptimizationResult {
    OptimizationResult {
        scratchpad: extract_tag(raw, SCRATCHPAD_TAG),
        analysis: extract_tag(raw, ANALYSIS_TAG),
        optimized_prompt: extract_tag(raw, OPTIMIZED_PROMPT_TAG),
        key_improvements: extract_tag(raw, KEY_IMPROVEMENTS_TAG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPLY: &str = "Sure! Here is my work.
<scratchpad>
- prompt is vague
</scratchpad>
<analysis>The prompt lacks an audience.</analysis>
<optimized_prompt>
You are an expert copywriter.
Write a product description wrapped in <description></description> tags.
</optimized_prompt>
<key_improvements>
1. Added a role
2. Added output format
</key_improvements>";

    #[test]
    fn extracts_all_four_sections() {
        let result = parse_llm_output(FULL_REPLY);
        assert_eq!(result.scratchpad, "- prompt is vague");
        assert_eq!(result.analysis, "The prompt lacks an audience.");
        assert_eq!(
            result.optimized_prompt,
            "You are an expert copywriter.\nWrite a product description wrapped in <description></description> tags."
        );
        assert_eq!(result.key_improvements, "1. Added a role\n2. Added output format");
    }

    #[test]
    fn missing_sections_are_empty() {
        let result = parse_llm_output("<analysis>only this</analysis>");
        assert_eq!(result.analysis, "only this");
        assert!(result.scratchpad.is_empty());
        assert!(result.optimized_prompt.is_empty());
        assert!(result.key_improvements.is_empty());
    }

    #[test]
    fn untagged_text_yields_empty_result() {
        assert!(parse_llm_output("I could not follow the format, sorry.").is_empty());
        assert!(parse_llm_output("").is_empty());
    }

    #[test]
    fn unclosed_tag_yields_empty() {
        assert_eq!(extract_tag("<analysis>never closed", "analysis"), "");
        assert_eq!(extract_tag("</analysis> backwards <analysis>", "analysis"), "");
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        assert_eq!(extract_tag("<ANALYSIS> loud </Analysis>", "analysis"), "loud");
        assert_eq!(extract_tag("<analysis>x</analysis>", "ANALYSIS"), "x");
    }

    #[test]
    fn stops_at_first_closing_tag() {
        let text = "<analysis>first</analysis> middle <analysis>second</analysis>";
        assert_eq!(extract_tag(text, "analysis"), "first");
    }

    #[test]
    fn non_ascii_content_is_preserved() {
        let text = "<optimized_prompt>\n  כתוב תיאור מוצר עבור בקבוק מים חכם  \n</OPTIMIZED_PROMPT>";
        assert_eq!(
            extract_tag(text, "optimized_prompt"),
            "כתוב תיאור מוצר עבור בקבוק מים חכם"
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        for tag in [SCRATCHPAD_TAG, ANALYSIS_TAG, OPTIMIZED_PROMPT_TAG, KEY_IMPROVEMENTS_TAG] {
            let once = extract_tag(FULL_REPLY, tag);
            let rewrapped = format!("<{tag}>{once}</{tag}>");
            assert_eq!(extract_tag(&rewrapped, tag), once, "tag {tag}");
        }
    }
}
