//! Error-tolerant, pattern-priority tokenizer for raw response text.
//!
//! At each scan position every pattern in the static table is evaluated;
//! the longest match wins, with earlier (higher-priority) patterns winning
//! length ties. Unrecognized characters are emitted as [`TokenKind::Unknown`]
//! tokens with a recorded warning — lexing never aborts.

mod incremental;
pub(crate) mod patterns;

pub use incremental::LexerState;

use crate::token::{LexError, Severity, Token, TokenKind};

/// The result of tokenizing a complete input.
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
    /// True iff no recorded error has [`Severity::Error`].
    ///
    /// The single-character recovery path only emits warnings, so this is
    /// currently true for every input; `Error` is reserved for stricter
    /// future modes.
    pub success: bool,
}

/// Pattern-priority tokenizer. Stateless; all state lives in the scan loop
/// (or in [`LexerState`] for the incremental mode).
#[derive(Debug, Default)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize `text` completely, appending a final [`TokenKind::Eof`] token.
    pub fn tokenize(&self, text: &str) -> LexOutput {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut pos = 0usize;
        let mut line = 1usize;
        let mut column = 1usize;

        while pos < text.len() {
            let rest = &text[pos..];
            match best_match(rest) {
                Some((kind, m)) => {
                    let value = &rest[..m.len];
                    let mut token = Token::new(kind, value, pos, line, column);
                    token.meta = m.meta;
                    tokens.push(token);
                    advance(value, &mut line, &mut column);
                    pos += m.len;
                }
                None => {
                    // Recovery: one Unknown token for the current character,
                    // a recorded warning, then continue from the next char.
                    let ch = rest.chars().next().expect("rest is non-empty");
                    let value = &rest[..ch.len_utf8()];
                    tokens.push(Token::new(TokenKind::Unknown, value, pos, line, column));
                    errors.push(LexError {
                        position: pos,
                        line,
                        column,
                        message: format!("unrecognized character {ch:?}"),
                        context: excerpt(text, pos),
                        severity: Severity::Warning,
                    });
                    log::trace!("lexer: unrecognized character {ch:?} at {line}:{column}");
                    advance(value, &mut line, &mut column);
                    pos += ch.len_utf8();
                }
            }
        }

        tokens.push(Token::new(TokenKind::Eof, "", pos, line, column));

        let success = !errors.iter().any(|e| e.severity == Severity::Error);
        LexOutput {
            tokens,
            errors,
            success,
        }
    }

    /// Incremental mode: append `chunk` to the state's buffer, re-tokenize
    /// the accumulated buffer, and return only the tokens judged complete.
    /// Incomplete trailing structures stay buffered for the next call.
    pub fn tokenize_incremental(&self, chunk: &str, state: &mut LexerState) -> Vec<Token> {
        incremental::tokenize_incremental(self, chunk, state)
    }
}

/// Evaluate every pattern at the start of `rest`; longest match wins,
/// first-in-table (highest priority) winning ties. The current best is only
/// replaced on a strictly greater length.
fn best_match(rest: &str) -> Option<(TokenKind, patterns::PatternMatch)> {
    let mut best: Option<(TokenKind, patterns::PatternMatch)> = None;
    for pattern in patterns::pattern_table() {
        if let Some(m) = pattern.try_match(rest) {
            let longer = best.as_ref().is_none_or(|(_, b)| m.len > b.len);
            if longer {
                best = Some((pattern.kind, m));
            }
        }
    }
    best
}

/// Advance line/column bookkeeping over consumed text. `\n` increments the
/// line and resets the column.
fn advance(consumed: &str, line: &mut usize, column: &mut usize) {
    for ch in consumed.chars() {
        if ch == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// A short source excerpt around `pos` for error context.
fn excerpt(text: &str, pos: usize) -> String {
    let start = floor_char_boundary(text, pos.saturating_sub(15));
    let end = floor_char_boundary(text, (pos + 15).min(text.len()));
    text[start..end].to_string()
}

/// Largest index `<= index` that lies on a char boundary.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
