//! Parser: raw response text → semantic AST.
//!
//! The structural pass locates tool-call JSON objects and fenced code
//! blocks by explicit scanning (balanced braces, string/escape aware) and
//! turns the gaps between them into text nodes. A second, gated pass
//! extracts semantic elements (file references, questions, commands) per
//! category. The parser reads raw text rather than the lexer's token
//! stream so that streaming responses can be re-parsed from an
//! accumulating buffer.

mod extract;
mod patterns;
#[cfg(test)]
mod tests;
mod validate;

pub use validate::validate;

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::ast::{AstNode, CodeNode, ResponseNode, TextNode, ToolCallNode};
use crate::lexer::patterns::balanced_json_len;

/// Languages whose code blocks are considered directly executable.
const EXECUTABLE_LANGUAGES: &[&str] = &[
    "bash",
    "sh",
    "shell",
    "powershell",
    "cmd",
    "bat",
    "python",
    "javascript",
    "ruby",
];

/// Options controlling a single parse.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Whether to run the semantic extraction pass (file references,
    /// questions, commands). Structural extraction always runs.
    pub extract_semantics: bool,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            extract_semantics: true,
        }
    }
}

/// What a parser implementation supports.
///
/// Callers inspect this before invoking implementation-specific behavior;
/// the contract supports multiple implementations even though only
/// [`DefaultParser`] exists today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserCapabilities {
    pub name: &'static str,
    pub streaming: bool,
    pub semantic_extraction: bool,
    pub validation: bool,
}

/// A parser of raw model response text.
pub trait ResponseParser: Send + Sync {
    /// Parse `text` into a response tree. Never fails: malformed input
    /// degrades to text nodes rather than aborting.
    fn parse(&self, text: &str, context: &ParseContext) -> ResponseNode;

    /// Describe what this implementation supports.
    fn capabilities(&self) -> ParserCapabilities;
}

/// Accumulate streamed chunks and parse once the stream ends.
///
/// No partial trees are emitted. Returns `None` if `cancelled` is set
/// before the final parse.
pub async fn parse_streaming<P: ResponseParser + ?Sized>(
    parser: &P,
    mut chunks: mpsc::UnboundedReceiver<String>,
    context: &ParseContext,
    cancelled: &AtomicBool,
) -> Option<ResponseNode> {
    let mut buffer = String::new();
    while let Some(chunk) = chunks.recv().await {
        if cancelled.load(Ordering::Relaxed) {
            return None;
        }
        buffer.push_str(&chunk);
    }
    if cancelled.load(Ordering::Relaxed) {
        return None;
    }
    Some(parser.parse(&buffer, context))
}

/// The default scanning parser.
#[derive(Debug, Default)]
pub struct DefaultParser;

impl DefaultParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser for DefaultParser {
    fn parse(&self, text: &str, context: &ParseContext) -> ResponseNode {
        let mut children = structural_pass(text);

        if context.extract_semantics {
            extract::extract_file_references(text, &mut children);
            extract::extract_questions(text, &mut children);
            extract::extract_commands(text, &mut children);
        }

        ResponseNode { children }
    }

    fn capabilities(&self) -> ParserCapabilities {
        ParserCapabilities {
            name: "default",
            streaming: true,
            semantic_extraction: true,
            validation: true,
        }
    }
}

/// A structural match found during the scan.
struct StructuralSpan {
    start: usize,
    end: usize,
    node: AstNode,
}

/// Locate tool-call JSON and fenced code blocks, filling the gaps between
/// them with text nodes. Matches are returned in position order.
fn structural_pass(text: &str) -> Vec<AstNode> {
    let mut spans: Vec<StructuralSpan> = Vec::new();

    // Code blocks first: a tool-call shaped object inside a fence is
    // example code, not an invocation.
    for caps in patterns::code_block_regex().captures_iter(text) {
        let whole = caps.get(0).expect("match exists");
        let language = caps.get(1).map(|g| g.as_str()).filter(|s| !s.is_empty());
        let body = caps.get(2).map(|g| g.as_str()).unwrap_or_default();
        spans.push(StructuralSpan {
            start: whole.start(),
            end: whole.end(),
            node: AstNode::Code(build_code_node(language, body, whole.start(), whole.end())),
        });
    }

    // Tool-call JSON objects outside code spans.
    let mut search_from = 0usize;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if spans.iter().any(|s| start >= s.start && start < s.end) {
            search_from = start + 1;
            continue;
        }
        let rest = &text[start..];
        match balanced_json_len(rest) {
            Some(len) if patterns::tool_key_regex().is_match(&rest[..len]) => {
                match parse_tool_call(&rest[..len]) {
                    Some(node) => {
                        spans.push(StructuralSpan {
                            start,
                            end: start + len,
                            node: AstNode::ToolCall(node),
                        });
                        search_from = start + len;
                    }
                    None => {
                        // Balanced but not valid JSON; degrade to text.
                        log::debug!("parser: skipping malformed tool-call JSON at byte {start}");
                        search_from = start + 1;
                    }
                }
            }
            _ => search_from = start + 1,
        }
    }

    spans.sort_by_key(|s| s.start);

    // Gaps between structural spans become text nodes.
    let mut children = Vec::new();
    let mut cursor = 0usize;
    for span in spans {
        push_text_gap(text, cursor, span.start, &mut children);
        cursor = span.end;
        children.push(span.node);
    }
    push_text_gap(text, cursor, text.len(), &mut children);

    children
}

fn push_text_gap(text: &str, start: usize, end: usize, children: &mut Vec<AstNode>) {
    if start >= end {
        return;
    }
    let content = &text[start..end];
    if content.trim().is_empty() {
        return;
    }
    children.push(AstNode::Text(TextNode {
        content: content.to_string(),
        start,
        end,
    }));
}

/// Parse a balanced tool-call JSON object into a node.
///
/// `tool` holds the name; `id`/`call_id` the correlation id; `parameters`
/// or `arguments` the argument object (defaulting to `{}`).
fn parse_tool_call(json: &str) -> Option<ToolCallNode> {
    let value: Value = serde_json::from_str(json).ok()?;
    let tool_name = value.get("tool")?.as_str().unwrap_or_default().to_string();
    let call_id = value
        .get("id")
        .or_else(|| value.get("call_id"))
        .and_then(|v| v.as_str())
        .map(String::from);
    let arguments = value
        .get("parameters")
        .or_else(|| value.get("arguments"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    Some(ToolCallNode {
        tool_name,
        call_id,
        arguments,
    })
}

/// Build a code node, lower-casing the language and extracting a file-name
/// hint from the first body line.
fn build_code_node(language: Option<&str>, body: &str, start: usize, end: usize) -> CodeNode {
    let language = language.map(|l| l.to_lowercase());
    let executable = language
        .as_deref()
        .is_some_and(|l| EXECUTABLE_LANGUAGES.contains(&l));

    let file_name = body.lines().next().and_then(|first| {
        let first = first.trim();
        patterns::file_name_comment_regex()
            .captures(first)
            .or_else(|| patterns::bare_file_name_regex().captures(first))
            .map(|caps| caps[1].to_string())
    });

    CodeNode {
        language,
        code: body.to_string(),
        file_name,
        executable,
        start,
        end,
    }
}
