//! Semantic AST over a parsed model response.
//!
//! The tree is shallow: a [`ResponseNode`] root owning an ordered list of
//! [`AstNode`] children. Structural children (tool calls, code blocks, text)
//! appear in source-position order; semantic children (file references,
//! questions, commands) are appended per category in their own match order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::token::Severity;

/// Root of a parsed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseNode {
    pub children: Vec<AstNode>,
}

impl ResponseNode {
    /// Iterate children of one variant, in child order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::ToolCall(tc) => Some(tc),
            _ => None,
        })
    }

    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::Code(c) => Some(c),
            _ => None,
        })
    }

    pub fn text_nodes(&self) -> impl Iterator<Item = &TextNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn file_references(&self) -> impl Iterator<Item = &FileReferenceNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::FileReference(f) => Some(f),
            _ => None,
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = &QuestionNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::Question(q) => Some(q),
            _ => None,
        })
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandNode> {
        self.children.iter().filter_map(|n| match n {
            AstNode::Command(c) => Some(c),
            _ => None,
        })
    }
}

/// A child node of the response tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AstNode {
    ToolCall(ToolCallNode),
    Code(CodeNode),
    Text(TextNode),
    FileReference(FileReferenceNode),
    Question(QuestionNode),
    Command(CommandNode),
}

/// A genuine tool invocation embedded in the response as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallNode {
    /// Name of the tool to invoke. Required; its absence is a validation error.
    pub tool_name: String,
    /// Correlation id, when the model supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Raw argument object, passed through to the tool executor.
    pub arguments: Value,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub code: String,
    /// File name hinted by a leading `file:` comment or bare `name.ext` line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Whether the language is in the interpreted/executable set.
    pub executable: bool,
    /// Byte range `[start, end)` within the parsed text.
    pub start: usize,
    pub end: usize,
}

/// A run of prose between structural elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub content: String,
    pub start: usize,
    pub end: usize,
}

/// How the surrounding text talks about a referenced file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Create,
    Write,
    Read,
    Delete,
    Modify,
    Navigate,
    /// No action keyword nearby; the path is merely mentioned.
    Mention,
}

/// A `path:start` or `path:start-end` suffix on a file reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReference {
    pub start: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

/// A file path mentioned in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReferenceNode {
    /// The path with any trailing `:line` suffix stripped.
    pub path: String,
    pub absolute: bool,
    pub reference_type: ReferenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_reference: Option<LineReference>,
}

/// Classification of a question the model asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    YesNo,
    MultipleChoice,
    Confirmation,
    Clarification,
    OpenEnded,
}

/// A question directed at the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub question: String,
    pub kind: QuestionKind,
}

/// A shell command suggested on a prompt-sigil line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandNode {
    pub command: String,
}

/// One finding from AST validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: Severity,
    /// Index of the offending node in the root's child list (non-owning).
    pub node_index: usize,
}

/// Outcome of validating a response tree.
///
/// Warnings and infos are carried on both variants; only `Error`-severity
/// issues make validation fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Success { issues: Vec<ValidationIssue> },
    Failure { issues: Vec<ValidationIssue> },
}

impl ValidationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Success { issues } | Self::Failure { issues } => issues,
        }
    }

    /// Build from collected issues: failure iff any has `Error` severity.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        if issues.iter().any(|i| i.severity == Severity::Error) {
            Self::Failure { issues }
        } else {
            Self::Success { issues }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_accessors() {
        let root = ResponseNode {
            children: vec![
                AstNode::Text(TextNode {
                    content: "hi".into(),
                    start: 0,
                    end: 2,
                }),
                AstNode::ToolCall(ToolCallNode {
                    tool_name: "read_file".into(),
                    call_id: None,
                    arguments: serde_json::json!({}),
                }),
                AstNode::Question(QuestionNode {
                    question: "Continue?".into(),
                    kind: QuestionKind::Confirmation,
                }),
            ],
        };
        assert_eq!(root.tool_calls().count(), 1);
        assert_eq!(root.text_nodes().count(), 1);
        assert_eq!(root.questions().count(), 1);
        assert_eq!(root.code_blocks().count(), 0);
    }

    #[test]
    fn test_validation_result_from_issues() {
        let warn = ValidationIssue {
            message: "missing call id".into(),
            severity: Severity::Warning,
            node_index: 0,
        };
        let result = ValidationResult::from_issues(vec![warn.clone()]);
        assert!(result.is_success());
        assert_eq!(result.issues().len(), 1);

        let err = ValidationIssue {
            message: "missing tool name".into(),
            severity: Severity::Error,
            node_index: 1,
        };
        let result = ValidationResult::from_issues(vec![warn, err]);
        assert!(!result.is_success());
        assert_eq!(result.issues().len(), 2);
    }
}
