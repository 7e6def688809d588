use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tokio::sync::mpsc;

use crate::ast::{AstNode, QuestionKind, ReferenceType};

use super::{parse_streaming, DefaultParser, ParseContext, ResponseParser};

fn parse(text: &str) -> crate::ast::ResponseNode {
    DefaultParser::new().parse(text, &ParseContext::default())
}

#[test]
fn test_tool_call_then_question() {
    let root = parse("{\"tool\":\"list_directory\",\"parameters\":{\"path\":\".\"}}\n\nWhat next?");

    let tool_calls: Vec<_> = root.tool_calls().collect();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].tool_name, "list_directory");
    assert_eq!(tool_calls[0].arguments, json!({"path": "."}));
    assert!(tool_calls[0].call_id.is_none());

    let texts: Vec<_> = root.text_nodes().collect();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].content.contains("What next?"));
}

#[test]
fn test_tool_call_with_id_and_arguments_key() {
    let root = parse(r#"{"tool":"grep","id":"c7","arguments":{"pattern":"fn"}}"#);
    let tc = root.tool_calls().next().expect("tool call parsed");
    assert_eq!(tc.call_id.as_deref(), Some("c7"));
    assert_eq!(tc.arguments, json!({"pattern": "fn"}));
}

#[test]
fn test_tool_call_without_arguments_defaults_to_empty_object() {
    let root = parse(r#"{"tool":"list_tools"}"#);
    let tc = root.tool_calls().next().expect("tool call parsed");
    assert_eq!(tc.arguments, json!({}));
}

#[test]
fn test_plain_json_is_not_a_tool_call() {
    let root = parse(r#"{"name":"config","value":1}"#);
    assert_eq!(root.tool_calls().count(), 0);
    assert_eq!(root.text_nodes().count(), 1);
}

#[test]
fn test_code_block_extraction() {
    let root = parse("Run this:\n```bash\necho hi\n```\ndone");
    let code: Vec<_> = root.code_blocks().collect();
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].language.as_deref(), Some("bash"));
    assert_eq!(code[0].code, "echo hi");
    assert!(code[0].executable);

    let texts: Vec<_> = root.text_nodes().collect();
    assert_eq!(texts.len(), 2);
}

#[test]
fn test_language_lowercased_and_executability() {
    let root = parse("```Python\nprint(1)\n```\n```rust\nfn main() {}\n```");
    let code: Vec<_> = root.code_blocks().collect();
    assert_eq!(code[0].language.as_deref(), Some("python"));
    assert!(code[0].executable);
    assert_eq!(code[1].language.as_deref(), Some("rust"));
    assert!(!code[1].executable);
}

#[test]
fn test_file_name_from_comment() {
    let root = parse("```python\n# file: setup.py\nprint(1)\n```");
    let code = root.code_blocks().next().expect("code block parsed");
    assert_eq!(code.file_name.as_deref(), Some("setup.py"));
}

#[test]
fn test_file_name_from_bare_first_line() {
    let root = parse("```\nCargo.toml\n[package]\n```");
    let code = root.code_blocks().next().expect("code block parsed");
    assert_eq!(code.file_name.as_deref(), Some("Cargo.toml"));
    assert!(code.language.is_none());
}

#[test]
fn test_tool_json_inside_fence_is_code_not_invocation() {
    let root = parse("Example:\n```json\n{\"tool\":\"rm\",\"parameters\":{}}\n```");
    assert_eq!(root.tool_calls().count(), 0);
    assert_eq!(root.code_blocks().count(), 1);
}

#[test]
fn test_structural_spans_in_position_order() {
    let root = parse("intro {\"tool\":\"a\"} middle ```sh\nls\n``` outro");
    let kinds: Vec<&'static str> = root
        .children
        .iter()
        .map(|n| match n {
            AstNode::Text(_) => "text",
            AstNode::ToolCall(_) => "tool",
            AstNode::Code(_) => "code",
            _ => "semantic",
        })
        .take(5)
        .collect();
    assert_eq!(kinds, vec!["text", "tool", "text", "code", "text"]);
}

#[test]
fn test_node_spans_within_bounds() {
    let text = "a {\"tool\":\"t\"} b ```c\nd\n``` e";
    let root = parse(text);
    for node in &root.children {
        let (start, end) = match node {
            AstNode::Text(t) => (t.start, t.end),
            AstNode::Code(c) => (c.start, c.end),
            _ => continue,
        };
        assert!(start < end && end <= text.len());
    }
}

#[test]
fn test_semantic_extraction_gated_by_context() {
    let text = "Please read src/lib.rs now. Should I proceed?\n$ cargo check";
    let with = DefaultParser::new().parse(text, &ParseContext::default());
    assert!(with.file_references().count() > 0);
    assert_eq!(with.questions().count(), 1);
    assert_eq!(with.commands().count(), 1);

    let without = DefaultParser::new().parse(
        text,
        &ParseContext {
            extract_semantics: false,
        },
    );
    assert_eq!(without.file_references().count(), 0);
    assert_eq!(without.questions().count(), 0);
    assert_eq!(without.commands().count(), 0);
}

#[test]
fn test_semantic_classification_end_to_end() {
    let text = "I will modify src/app.rs:10 next. Should I continue?";
    let root = parse(text);

    let file_ref = root.file_references().next().expect("file ref parsed");
    assert_eq!(file_ref.path, "src/app.rs");
    assert_eq!(file_ref.reference_type, ReferenceType::Modify);
    assert_eq!(file_ref.line_reference.map(|l| l.start), Some(10));

    let question = root.questions().next().expect("question parsed");
    assert_eq!(question.kind, QuestionKind::YesNo);
}

#[test]
fn test_malformed_input_degrades_to_text() {
    let root = parse("{\"tool\": unterminated and ``` an open fence");
    assert_eq!(root.tool_calls().count(), 0);
    assert_eq!(root.code_blocks().count(), 0);
    assert!(root.text_nodes().count() >= 1);
}

#[test]
fn test_capabilities_descriptor() {
    let caps = DefaultParser::new().capabilities();
    assert_eq!(caps.name, "default");
    assert!(caps.streaming);
    assert!(caps.semantic_extraction);
    assert!(caps.validation);
}

#[tokio::test]
async fn test_streaming_accumulates_then_parses_once() {
    let parser = DefaultParser::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let cancelled = AtomicBool::new(false);

    tx.send("{\"tool\":\"list_di".to_string()).expect("send ok");
    tx.send("rectory\",\"parameters\":{}}\n\nWhat next?".to_string())
        .expect("send ok");
    drop(tx);

    let root = parse_streaming(&parser, rx, &ParseContext::default(), &cancelled)
        .await
        .expect("not cancelled");
    assert_eq!(root.tool_calls().count(), 1);
    assert_eq!(
        root.tool_calls().next().map(|t| t.tool_name.as_str()),
        Some("list_directory")
    );
}

#[tokio::test]
async fn test_streaming_cancellation_aborts_before_parse() {
    let parser = DefaultParser::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let cancelled = AtomicBool::new(false);

    tx.send("some text".to_string()).expect("send ok");
    cancelled.store(true, Ordering::Relaxed);
    drop(tx);

    let result = parse_streaming(&parser, rx, &ParseContext::default(), &cancelled).await;
    assert!(result.is_none());
}
