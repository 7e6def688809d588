//! Lexical token and error value types.
//!
//! Tokens are immutable once produced by the lexer. Each token carries its
//! byte position plus 1-based line/column coordinates so downstream
//! consumers can map back into the original response text.

use serde::{Deserialize, Serialize};

/// The kind of a lexical token, ordered roughly by pattern priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A balanced JSON object containing a `"tool"` key (a tool invocation).
    ToolCallJson,
    /// A triple-backtick fence delimiter, optionally with a language tag.
    CodeFence,
    /// A file system path, optionally with a `:line` suffix.
    FilePath,
    /// A URL with an explicit scheme or `www.` prefix.
    Url,
    /// An email address.
    Email,
    /// `{`
    BraceOpen,
    /// `}`
    BraceClose,
    /// `[`
    BracketOpen,
    /// `]`
    BracketClose,
    /// An ATX-style markdown header (`#` through `######`).
    MarkdownHeader,
    /// Bold markdown text (`**text**`).
    MarkdownBold,
    /// A sentence starting with an interrogative word and ending in `?`.
    Question,
    /// A line starting with a shell prompt sigil (`$`, `>`, `#`).
    Command,
    /// A run of plain characters up to the next special character.
    Text,
    /// A single `\n`.
    Newline,
    /// A single character no pattern recognized (error recovery).
    Unknown,
    /// End of input. Always the final token.
    Eof,
}

/// Typed metadata extracted while matching a token.
///
/// A closed variant set instead of an untyped bag: each token kind that
/// carries extra data has exactly one payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMeta {
    /// Line number extracted from a `path:N` file reference.
    LineNumber(u32),
    /// Language tag extracted from a code-fence opener.
    Language(String),
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text this token covers.
    pub value: String,
    /// Byte offset into the source text.
    pub position: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Length of `value` in bytes.
    pub length: usize,
    /// Optional typed payload (extracted language, line number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<TokenMeta>,
}

impl Token {
    /// Create a token covering `value` at the given coordinates.
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        let value = value.into();
        let length = value.len();
        Self {
            kind,
            value,
            position,
            line,
            column,
            length,
            meta: None,
        }
    }

    /// Attach a typed metadata payload.
    pub fn with_meta(mut self, meta: TokenMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Whether this is the end-of-input sentinel.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Severity of a lexical or validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A recoverable lexical error.
///
/// Lexing never halts: the offending character is emitted as an
/// [`TokenKind::Unknown`] token, one of these is recorded, and scanning
/// continues from the next character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexError {
    /// Byte offset of the offending character.
    pub position: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    pub message: String,
    /// Surrounding source excerpt for diagnostics.
    pub context: String,
    pub severity: Severity,
}
