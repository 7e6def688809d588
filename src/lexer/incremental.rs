//! Incremental (streaming) tokenization.
//!
//! The incremental mode re-runs the same pure tokenizer over an accumulating
//! buffer and yields only tokens judged complete by kind-specific
//! heuristics. Incomplete trailing structures — an unterminated fenced code
//! block, a JSON object whose braces have not balanced yet, a text run that
//! may continue in the next chunk — stay in the buffer for the next call.

use crate::token::{Token, TokenKind};

use super::patterns::balanced_json_len;
use super::Lexer;

/// Carry-over state between incremental tokenization calls.
#[derive(Debug, Default)]
pub struct LexerState {
    /// Accumulated input not yet emitted as complete tokens.
    buffer: String,
    /// Stream-absolute byte offset of the start of `buffer`.
    base_position: usize,
    /// 1-based line number at the start of `buffer`.
    base_line: usize,
    /// 1-based column number at the start of `buffer`.
    base_column: usize,
}

impl LexerState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            base_position: 0,
            base_line: 1,
            base_column: 1,
        }
    }

    /// The input currently held back as incomplete.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Flush the remaining buffered input as-is, completing all tokens.
    ///
    /// Call at end of stream; the buffer is left empty.
    pub fn finish(&mut self, lexer: &Lexer) -> Vec<Token> {
        let output = lexer.tokenize(&self.buffer);
        let mut tokens: Vec<Token> = output
            .tokens
            .into_iter()
            .filter(|t| !t.is_eof())
            .map(|t| self.rebase(t))
            .collect();
        let consumed = std::mem::take(&mut self.buffer);
        self.advance_base(&consumed);
        tokens.shrink_to_fit();
        tokens
    }

    /// Rebase a buffer-relative token to stream-absolute coordinates.
    fn rebase(&self, mut token: Token) -> Token {
        token.position += self.base_position;
        if token.line == 1 {
            token.column += self.base_column - 1;
        }
        token.line += self.base_line - 1;
        token
    }

    /// Advance the base coordinates past `consumed`.
    fn advance_base(&mut self, consumed: &str) {
        self.base_position += consumed.len();
        for ch in consumed.chars() {
            if ch == '\n' {
                self.base_line += 1;
                self.base_column = 1;
            } else {
                self.base_column += 1;
            }
        }
    }
}

/// Append `chunk`, re-tokenize the whole buffer, emit the complete prefix.
pub(super) fn tokenize_incremental(
    lexer: &Lexer,
    chunk: &str,
    state: &mut LexerState,
) -> Vec<Token> {
    state.buffer.push_str(chunk);

    let output = lexer.tokenize(&state.buffer);
    let tokens: Vec<Token> = output.tokens.into_iter().filter(|t| !t.is_eof()).collect();

    // Find the first incomplete token; everything before it is emitted,
    // everything from it on stays buffered.
    let cut = first_incomplete(&tokens, &state.buffer).unwrap_or(tokens.len());
    let cut_pos = tokens
        .get(cut)
        .map(|t| t.position)
        .unwrap_or(state.buffer.len());

    let emitted: Vec<Token> = tokens
        .into_iter()
        .take(cut)
        .map(|t| state.rebase(t))
        .collect();

    let consumed: String = state.buffer.drain(..cut_pos).collect();
    state.advance_base(&consumed);

    emitted
}

/// Index of the first token that is not yet complete, if any.
fn first_incomplete(tokens: &[Token], buffer: &str) -> Option<usize> {
    let mut in_fence = false;
    for (i, token) in tokens.iter().enumerate() {
        let opens_fence = token.kind == TokenKind::CodeFence && !in_fence;
        if token.kind == TokenKind::CodeFence {
            in_fence = !in_fence;
        }

        if opens_fence {
            // A fence opener is complete only if a closing fence follows.
            let closed = tokens[i + 1..]
                .iter()
                .any(|t| t.kind == TokenKind::CodeFence);
            if !closed {
                return Some(i);
            }
        }

        match token.kind {
            // A lone structural opener is complete only once the whole
            // object balances (string/escape aware); until then the JSON
            // may still be growing into a tool-call token.
            TokenKind::BraceOpen | TokenKind::BracketOpen => {
                if balanced_json_len(&buffer[token.position..]).is_none() {
                    return Some(i);
                }
            }
            _ => {}
        }

        // Tokens that touch the end of the buffer may still grow.
        if token.position + token.length == buffer.len() && may_continue(token.kind) {
            return Some(i);
        }
    }
    None
}

/// Whether a token of this kind touching the buffer end could be extended
/// by the next chunk.
fn may_continue(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Text
            | TokenKind::FilePath
            | TokenKind::Url
            | TokenKind::Email
            | TokenKind::MarkdownHeader
            | TokenKind::Question
            | TokenKind::Command
            | TokenKind::CodeFence
            | TokenKind::Unknown
    )
}
