//! Block sanitization.
//!
//! `sanitize` is a pure function from block to block: it never mutates its
//! input and is idempotent, so re-sanitizing already-sanitized content is a
//! no-op. Text blocks get the full treatment — tool-invocation JSON and
//! tool-chatter lines are machine plumbing that must never reach the
//! renderer — while code and system messages only get whitespace cleanup.

use std::sync::OnceLock;

use regex::Regex;

use crate::block::{BlockPayload, ContentBlock};
use crate::lexer::patterns::balanced_json_len;

/// Lines mentioning these slip through as plumbing chatter when a model
/// narrates its own invocations.
const TOOL_VOCABULARY: &[&str] = &["tool call", "function call", "invoke"];

/// Known tool identifiers; a line naming one is dropped unless it is a
/// user-facing error notice.
const TOOL_NAMES: &[&str] = &[
    "read_file",
    "write_file",
    "list_directory",
    "execute_command",
    "search_files",
    "web_search",
];

static TOOLISH_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
static ERROR_NOTICE_REGEX: OnceLock<Regex> = OnceLock::new();
static EMPTY_JSON_FENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static EXCESS_NEWLINES_REGEX: OnceLock<Regex> = OnceLock::new();
static DOUBLE_NEWLINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn toolish_key_regex() -> &'static Regex {
    TOOLISH_KEY_REGEX.get_or_init(|| {
        Regex::new(r#""(?:tool|function|tool_call)"\s*:"#).expect("toolish key pattern is valid")
    })
}

fn error_notice_regex() -> &'static Regex {
    ERROR_NOTICE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:tool execution error:|tool '[^']*' failed)")
            .expect("error notice pattern is valid")
    })
}

fn empty_json_fence_regex() -> &'static Regex {
    EMPTY_JSON_FENCE_REGEX.get_or_init(|| {
        Regex::new(r"```(?:json)?[ \t]*\n?\s*```").expect("empty fence pattern is valid")
    })
}

fn excess_newlines_regex() -> &'static Regex {
    EXCESS_NEWLINES_REGEX.get_or_init(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"))
}

fn double_newline_regex() -> &'static Regex {
    DOUBLE_NEWLINE_REGEX.get_or_init(|| Regex::new(r"\n{2}").expect("newline pattern is valid"))
}

/// Produce a cleaned copy of `block`.
///
/// A block whose payload sanitizes to nothing comes back with empty content
/// and `complete = false` so the pipeline can drop it instead of rendering
/// a blank.
pub fn sanitize(block: &ContentBlock) -> ContentBlock {
    let mut out = block.clone();
    match &block.payload {
        BlockPayload::Text { content } => {
            let cleaned = sanitize_text(content);
            if cleaned.is_empty() {
                out.complete = false;
            }
            out.payload = BlockPayload::Text { content: cleaned };
        }
        BlockPayload::Code { code, language } => {
            let cleaned = strip_line_trailing_whitespace(code).trim().to_string();
            if cleaned.is_empty() {
                out.complete = false;
            }
            out.payload = BlockPayload::Code {
                code: cleaned,
                language: language.clone(),
            };
        }
        BlockPayload::SystemMessage { message, kind } => {
            let cleaned = message.trim().to_string();
            if cleaned.is_empty() {
                out.complete = false;
            }
            out.payload = BlockPayload::SystemMessage {
                message: cleaned,
                kind: *kind,
            };
        }
    }
    out
}

fn sanitize_text(content: &str) -> String {
    let redacted = redact_tool_json(content);
    let kept: Vec<&str> = redacted
        .lines()
        .filter(|line| !is_tool_chatter(line))
        .collect();
    let joined = kept.join("\n");
    let joined = empty_json_fence_regex().replace_all(&joined, "");
    let joined = strip_line_trailing_whitespace(&joined);
    let joined = excess_newlines_regex().replace_all(&joined, "\n\n");
    let joined = double_newline_regex().replace_all(&joined, "\n");
    joined.trim().to_string()
}

/// Remove balanced JSON objects whose keys mark them as tool invocations.
fn redact_tool_json(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(offset) = rest.find('{') {
        let (before, candidate) = rest.split_at(offset);
        out.push_str(before);
        match balanced_json_len(candidate) {
            Some(len) if toolish_key_regex().is_match(&candidate[..len]) => {
                rest = &candidate[len..];
            }
            _ => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_tool_chatter(line: &str) -> bool {
    // Error notices are the user-facing surface of a failed call; keep them.
    if error_notice_regex().is_match(line) {
        return false;
    }
    let lower = line.to_lowercase();
    TOOL_VOCABULARY.iter().any(|word| lower.contains(word))
        || TOOL_NAMES.iter().any(|name| lower.contains(name))
}

fn strip_line_trailing_whitespace(text: &str) -> String {
    text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}
