//! Structural AST validation.
//!
//! Validation never fails the parse; it reports findings with severities
//! and only `Error`-severity findings make the overall result a failure.

use crate::ast::{AstNode, ResponseNode, ValidationIssue, ValidationResult};
use crate::token::Severity;

/// Validate a parsed response tree.
///
/// Rules:
/// - a tool call with an empty tool name is an `Error`;
/// - a tool call without a call id is a `Warning`;
/// - a code block without a language tag is an `Info`.
pub fn validate(root: &ResponseNode) -> ValidationResult {
    let mut issues = Vec::new();

    for (index, node) in root.children.iter().enumerate() {
        match node {
            AstNode::ToolCall(tc) => {
                if tc.tool_name.trim().is_empty() {
                    issues.push(ValidationIssue {
                        message: "tool call is missing a tool name".to_string(),
                        severity: Severity::Error,
                        node_index: index,
                    });
                }
                if tc.call_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
                    issues.push(ValidationIssue {
                        message: "tool call is missing a call id".to_string(),
                        severity: Severity::Warning,
                        node_index: index,
                    });
                }
            }
            AstNode::Code(code) => {
                if code.language.is_none() {
                    issues.push(ValidationIssue {
                        message: "code block has no language tag".to_string(),
                        severity: Severity::Info,
                        node_index: index,
                    });
                }
            }
            _ => {}
        }
    }

    ValidationResult::from_issues(issues)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::ast::{CodeNode, ToolCallNode};

    use super::*;

    fn tool_call(name: &str, call_id: Option<&str>) -> AstNode {
        AstNode::ToolCall(ToolCallNode {
            tool_name: name.to_string(),
            call_id: call_id.map(String::from),
            arguments: json!({}),
        })
    }

    #[test]
    fn test_missing_tool_name_is_error() {
        let root = ResponseNode {
            children: vec![tool_call("", Some("c1"))],
        };
        let result = validate(&root);
        assert!(!result.is_success());
        assert_eq!(result.issues()[0].severity, Severity::Error);
        assert_eq!(result.issues()[0].node_index, 0);
    }

    #[test]
    fn test_missing_call_id_is_warning_only() {
        let root = ResponseNode {
            children: vec![tool_call("read_file", None)],
        };
        let result = validate(&root);
        assert!(result.is_success(), "warnings must not fail validation");
        assert_eq!(result.issues()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_untagged_code_block_is_info() {
        let root = ResponseNode {
            children: vec![AstNode::Code(CodeNode {
                language: None,
                code: "echo hi".to_string(),
                file_name: None,
                executable: false,
                start: 0,
                end: 7,
            })],
        };
        let result = validate(&root);
        assert!(result.is_success());
        assert_eq!(result.issues()[0].severity, Severity::Info);
    }

    #[test]
    fn test_clean_tree_has_no_issues() {
        let root = ResponseNode {
            children: vec![tool_call("read_file", Some("c1"))],
        };
        let result = validate(&root);
        assert!(result.is_success());
        assert!(result.issues().is_empty());
    }
}
