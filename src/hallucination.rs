//! Heuristic detection of model-fabricated tool results.
//!
//! The detector classifies raw response text against a set of independent
//! checks — fake tool-result markers, invented file content, directory
//! listings, suspicious code blocks, and unsubstantiated first-person
//! claims — combined with a flag saying whether any real tool call
//! happened. It never fails: classification only returns confidence flags
//! and a suggested remediation for the caller to act on.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum fenced-block body size before the complete-unit heuristic fires.
const SUSPICIOUS_CODE_MIN_LEN: usize = 100;

static TOOL_RESULT_MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
static TOOL_RESULT_JSON_REGEX: OnceLock<Regex> = OnceLock::new();
static FILE_CONTENT_PHRASE_REGEX: OnceLock<Regex> = OnceLock::new();
static DIRECTORY_LISTING_REGEX: OnceLock<Regex> = OnceLock::new();
static CLAIM_REGEX: OnceLock<Regex> = OnceLock::new();
static FENCED_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static COMPLETE_UNIT_REGEX: OnceLock<Regex> = OnceLock::new();
static TREE_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static BRACKET_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static EXCESS_NEWLINES_REGEX: OnceLock<Regex> = OnceLock::new();

fn tool_result_marker_regex() -> &'static Regex {
    TOOL_RESULT_MARKER_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\[Tool Result\]|\[Output\]|<<<[^>]*>>>|```tool\b")
            .expect("marker pattern is valid")
    })
}

fn tool_result_json_regex() -> &'static Regex {
    TOOL_RESULT_JSON_REGEX.get_or_init(|| {
        Regex::new(r#"(?is)\[Tool Result\]\s*\{[^}]*"tool""#).expect("marker+json pattern is valid")
    })
}

fn file_content_phrase_regex() -> &'static Regex {
    FILE_CONTENT_PHRASE_REGEX.get_or_init(|| {
        Regex::new(r"(?is)(?:here(?:'s| is) the content|file contains|contents? of the file)\b.{0,80}?```")
            .expect("file content pattern is valid")
    })
}

fn directory_listing_regex() -> &'static Regex {
    DIRECTORY_LISTING_REGEX.get_or_init(|| {
        Regex::new(r"(?i)├──|└──|│|Directory listing:|Files found:")
            .expect("listing pattern is valid")
    })
}

fn claim_regex() -> &'static Regex {
    CLAIM_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\bI(?:'ve| have)? (?:just )?(?:read|checked|examined|executed|ran|listed|looked at|inspected)\b",
        )
        .expect("claim pattern is valid")
    })
}

fn fenced_block_regex() -> &'static Regex {
    FENCED_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+#.-]*[ \t]*\n(.*?)\n?```").expect("fence pattern is valid")
    })
}

fn complete_unit_regex() -> &'static Regex {
    COMPLETE_UNIT_REGEX.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:(?:public|private|internal|export)\s+)?(?:class|interface|namespace|struct|impl|module)\s+\w+|^\s*(?:fn|def|function)\s+\w+|^\s*module\.exports\b",
        )
        .expect("complete unit pattern is valid")
    })
}

fn tree_line_regex() -> &'static Regex {
    TREE_LINE_REGEX
        .get_or_init(|| Regex::new(r"(?m)^.*(?:├──|└──|│).*$\n?").expect("tree line pattern is valid"))
}

fn bracket_block_regex() -> &'static Regex {
    BRACKET_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?is)\[(?:Tool Result|Output)\](?:\s*\{.*?\}|[^\n]*)|<<<[^>]*>>>|```tool\b[^`]*```")
            .expect("bracket block pattern is valid")
    })
}

fn excess_newlines_regex() -> &'static Regex {
    EXCESS_NEWLINES_REGEX
        .get_or_init(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"))
}

/// What the detector found in one response.
#[derive(Debug, Clone, Default)]
pub struct HallucinationReport {
    /// Overall verdict; see the combination rule on [`check`].
    pub hallucinating: bool,
    pub fake_tool_results: bool,
    pub fake_file_content: bool,
    pub fake_directory_listing: bool,
    /// Count of unsubstantiated first-person claims (not a boolean: the
    /// number feeds the combination rule).
    pub unsubstantiated_claims: usize,
    pub suspicious_code_blocks: bool,
    /// One human-readable entry per matched check.
    pub issues: Vec<String>,
    /// Remediation hint for the caller when hallucinating.
    pub suggested_action: Option<String>,
}

/// Classify `response` for fabricated tool activity.
///
/// `had_tool_calls` is whether a real tool call actually happened during
/// this exchange; most checks only fire when it is false.
///
/// The verdict is `fake_tool_results ∨ fake_file_content ∨
/// fake_directory_listing ∨ suspicious_code_blocks ∨
/// (claims > 0 ∧ issues > 1)` — unsubstantiated claims alone are not
/// sufficient, they must co-occur with another flagged issue.
pub fn check(response: &str, had_tool_calls: bool) -> HallucinationReport {
    let mut report = HallucinationReport::default();

    if tool_result_marker_regex().is_match(response)
        || tool_result_json_regex().is_match(response)
    {
        report.fake_tool_results = true;
        report
            .issues
            .push("response contains fabricated tool-result markers".to_string());
    }

    if !had_tool_calls && file_content_phrase_regex().is_match(response) {
        report.fake_file_content = true;
        report
            .issues
            .push("response presents file content without a tool call".to_string());
    }

    if !had_tool_calls {
        let claims = claim_regex().find_iter(response).count();
        if claims > 0 {
            report.unsubstantiated_claims = claims;
            report.issues.push(format!(
                "{claims} unsubstantiated claim(s) of performed actions"
            ));
        }
    }

    if !had_tool_calls && directory_listing_regex().is_match(response) {
        report.fake_directory_listing = true;
        report
            .issues
            .push("response contains a directory listing without a tool call".to_string());
    }

    if !had_tool_calls && has_suspicious_code_block(response) {
        report.suspicious_code_blocks = true;
        report
            .issues
            .push("response contains complete-looking code without a tool call".to_string());
    }

    report.hallucinating = report.fake_tool_results
        || report.fake_file_content
        || report.fake_directory_listing
        || report.suspicious_code_blocks
        || (report.unsubstantiated_claims > 0 && report.issues.len() > 1);

    if report.hallucinating {
        report.suggested_action = Some(
            "discard the fabricated content and retry with stricter prompting".to_string(),
        );
        log::warn!(
            "hallucination detected: {} issue(s): {}",
            report.issues.len(),
            report.issues.join("; ")
        );
    }

    report
}

/// Whether any fenced block ≥100 chars looks like a complete unit of code.
fn has_suspicious_code_block(response: &str) -> bool {
    fenced_block_regex().captures_iter(response).any(|caps| {
        let body = caps.get(1).map(|g| g.as_str()).unwrap_or_default();
        body.len() >= SUSPICIOUS_CODE_MIN_LEN && complete_unit_regex().is_match(body)
    })
}

/// Best-effort rewrite stripping hallucinated markers from `response`.
///
/// Removes fake-result markers and bracketed pseudo-output blocks, removes
/// directory-tree-drawing lines, collapses 3+ consecutive newlines into a
/// single blank line, and trims. Not guaranteed lossless.
pub fn clean(response: &str) -> String {
    let cleaned = bracket_block_regex().replace_all(response, "");
    let cleaned = tree_line_regex().replace_all(&cleaned, "");
    let cleaned = excess_newlines_regex().replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_marker_with_json() {
        let report = check("[Tool Result]\n{\"tool\":\"x\"}", false);
        assert!(report.hallucinating);
        assert!(report.fake_tool_results);
        assert!(report.suggested_action.is_some());
    }

    #[test]
    fn test_plain_statement_is_clean() {
        let report = check("The sky is blue.", false);
        assert!(!report.hallucinating);
        assert!(report.issues.is_empty());
        assert!(report.suggested_action.is_none());
    }

    #[test]
    fn test_marker_fires_even_with_tool_calls() {
        // Markers are fabricated output framing regardless of whether a
        // real call happened; the model never legitimately prints them.
        let report = check("[Output] done", true);
        assert!(report.fake_tool_results);
        assert!(report.hallucinating);
    }

    #[test]
    fn test_fake_file_content_requires_no_tool_calls() {
        let response = "Here is the content of the file:\n```\nline one\n```";
        assert!(check(response, false).fake_file_content);
        assert!(!check(response, true).fake_file_content);
    }

    #[test]
    fn test_directory_listing_glyphs() {
        let response = "project/\n├── src\n└── tests";
        let report = check(response, false);
        assert!(report.fake_directory_listing);
        assert!(report.hallucinating);
        assert!(!check(response, true).fake_directory_listing);
    }

    #[test]
    fn test_claims_alone_are_not_hallucination() {
        let report = check("I have checked the configuration.", false);
        assert_eq!(report.unsubstantiated_claims, 1);
        assert_eq!(report.issues.len(), 1);
        assert!(!report.hallucinating, "claims alone must not trip the verdict");
    }

    #[test]
    fn test_claims_plus_listing_is_hallucination() {
        let response = "I have listed the files.\n├── src\n└── tests";
        let report = check(response, false);
        assert!(report.unsubstantiated_claims > 0);
        assert!(report.fake_directory_listing);
        assert!(report.hallucinating);
    }

    #[test]
    fn test_suspicious_code_block() {
        let body = "class UserService {\n".to_string()
            + &"    doWork();\n".repeat(12)
            + "}";
        let response = format!("```java\n{body}\n```");
        assert!(body.len() >= SUSPICIOUS_CODE_MIN_LEN);
        assert!(check(&response, false).suspicious_code_blocks);
        assert!(!check(&response, true).suspicious_code_blocks);
    }

    #[test]
    fn test_short_code_block_not_suspicious() {
        let report = check("```java\nclass A {}\n```", false);
        assert!(!report.suspicious_code_blocks);
    }

    #[test]
    fn test_clean_strips_markers_and_trees() {
        let dirty = "Real text.\n[Tool Result] {\"tool\":\"x\"}\n├── fake\n└── tree\n\n\n\nMore text.";
        let cleaned = clean(dirty);
        assert!(!cleaned.contains("[Tool Result]"));
        assert!(!cleaned.contains("├──"));
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.starts_with("Real text."));
        assert!(cleaned.ends_with("More text."));
    }

    #[test]
    fn test_clean_is_stable_on_clean_input() {
        let text = "Nothing suspicious here.\n\nJust prose.";
        assert_eq!(clean(text), text);
    }
}
