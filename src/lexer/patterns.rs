//! The static, priority-ordered pattern table driving the lexer.
//!
//! Patterns are compiled once into `OnceLock` statics and scanned linearly
//! at each position. Priority order is part of the lexer contract: when two
//! patterns produce equal-length matches, the one earlier in this table wins.

use std::sync::OnceLock;

use regex::Regex;

use crate::token::{TokenKind, TokenMeta};

/// A successful pattern match at the current scan position.
#[derive(Debug)]
pub(crate) struct PatternMatch {
    /// Matched length in bytes.
    pub len: usize,
    /// Typed payload extracted during matching.
    pub meta: Option<TokenMeta>,
}

/// How a pattern matches: a compiled anchored regex, or a custom scanner.
pub(crate) enum Matcher {
    Regex(&'static Regex),
    /// Custom scanner over the remaining input.
    Custom(fn(&str) -> Option<PatternMatch>),
}

/// One entry in the lexer's pattern table.
pub(crate) struct Pattern {
    pub kind: TokenKind,
    pub matcher: Matcher,
}

impl Pattern {
    /// Try to match this pattern at the start of `rest`.
    pub fn try_match(&self, rest: &str) -> Option<PatternMatch> {
        match &self.matcher {
            Matcher::Regex(re) => {
                let m = re.find(rest)?;
                if m.start() != 0 || m.is_empty() {
                    return None;
                }
                Some(PatternMatch {
                    len: m.end(),
                    meta: extract_meta(self.kind, m.as_str()),
                })
            }
            Matcher::Custom(f) => f(rest),
        }
    }
}

static CODE_FENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static FILE_PATH_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static MD_HEADER_REGEX: OnceLock<Regex> = OnceLock::new();
static MD_BOLD_REGEX: OnceLock<Regex> = OnceLock::new();
static QUESTION_REGEX: OnceLock<Regex> = OnceLock::new();
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();
static FENCE_LANG_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_LINE_REGEX: OnceLock<Regex> = OnceLock::new();
static TOOL_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn code_fence_regex() -> &'static Regex {
    CODE_FENCE_REGEX.get_or_init(|| {
        Regex::new(r"^```[A-Za-z0-9_+#.-]*").expect("code fence pattern is valid")
    })
}

fn file_path_regex() -> &'static Regex {
    FILE_PATH_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^
            (?:[A-Za-z]:)?                     # optional drive prefix
            (?:\.{1,2}[/\\]|[/\\]|~[/\\])?     # optional leading ./ ../ / ~/
            (?:[\w.@-]+[/\\])+                 # at least one separated segment
            [\w.@-]+                           # final segment
            (?::\d+(?:-\d+)?)?                 # optional :line or :line-line
            ",
        )
        .expect("file path pattern is valid")
    })
}

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?:(?:https?|ftps?|file|git|ssh)://|www\.)[^\s<>{}|\\^`\[\]]+")
            .expect("url pattern is valid")
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("email pattern is valid"))
}

fn md_header_regex() -> &'static Regex {
    MD_HEADER_REGEX
        .get_or_init(|| Regex::new(r"^#{1,6}[ \t]+[^\n]*").expect("header pattern is valid"))
}

fn md_bold_regex() -> &'static Regex {
    MD_BOLD_REGEX
        .get_or_init(|| Regex::new(r"^\*\*[^*\n]+\*\*").expect("bold pattern is valid"))
}

fn question_regex() -> &'static Regex {
    QUESTION_REGEX.get_or_init(|| {
        Regex::new(
            r"(?ix)
            ^
            (?:who|whom|whose|what|when|where|why|how|which
              |is|are|was|were|do|does|did|can|could|should|would|will|may|shall)
            \b
            [^\n?]*
            \?
            ",
        )
        .expect("question pattern is valid")
    })
}

fn command_regex() -> &'static Regex {
    COMMAND_REGEX
        .get_or_init(|| Regex::new(r"^[$>#][ \t]+[^\n]+").expect("command pattern is valid"))
}

fn fence_lang_regex() -> &'static Regex {
    FENCE_LANG_REGEX
        .get_or_init(|| Regex::new(r"^```([A-Za-z0-9_+#.-]+)").expect("fence lang pattern is valid"))
}

fn path_line_regex() -> &'static Regex {
    PATH_LINE_REGEX
        .get_or_init(|| Regex::new(r":(\d+)(?:-\d+)?$").expect("path line pattern is valid"))
}

fn tool_key_regex() -> &'static Regex {
    TOOL_KEY_REGEX
        .get_or_init(|| Regex::new(r#""tool"\s*:"#).expect("tool key pattern is valid"))
}

/// Extract the typed payload for kinds that carry one.
fn extract_meta(kind: TokenKind, matched: &str) -> Option<TokenMeta> {
    match kind {
        TokenKind::CodeFence => fence_lang_regex()
            .captures(matched)
            .map(|c| TokenMeta::Language(c[1].to_ascii_lowercase())),
        TokenKind::FilePath => path_line_regex()
            .captures(matched)
            .and_then(|c| c[1].parse::<u32>().ok())
            .map(TokenMeta::LineNumber),
        _ => None,
    }
}

/// Find the byte length of a balanced JSON object/array starting at the
/// first byte of `rest`, tracking string literals and escapes so braces
/// inside strings are ignored. Returns `None` if the structure never closes.
pub(crate) fn balanced_json_len(rest: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Custom matcher: a balanced JSON object containing a `"tool"` key.
fn match_tool_call_json(rest: &str) -> Option<PatternMatch> {
    if !rest.starts_with('{') {
        return None;
    }
    let len = balanced_json_len(rest)?;
    if !tool_key_regex().is_match(&rest[..len]) {
        return None;
    }
    Some(PatternMatch { len, meta: None })
}

/// Custom matcher: a run of plain characters, stopping at any special
/// character (backtick, brace, bracket, asterisk, hash, or newline).
fn match_text_run(rest: &str) -> Option<PatternMatch> {
    let mut len = 0usize;
    for ch in rest.chars() {
        if matches!(ch, '`' | '{' | '}' | '[' | ']' | '*' | '#' | '\n') {
            break;
        }
        len += ch.len_utf8();
    }
    if len == 0 {
        None
    } else {
        Some(PatternMatch { len, meta: None })
    }
}

// fn pointers cannot capture, so each single-char matcher is its own function.
macro_rules! single_char_matcher {
    ($name:ident, $ch:literal) => {
        fn $name(rest: &str) -> Option<PatternMatch> {
            if rest.starts_with($ch) {
                Some(PatternMatch {
                    len: $ch.len_utf8(),
                    meta: None,
                })
            } else {
                None
            }
        }
    };
}

single_char_matcher!(match_brace_open, '{');
single_char_matcher!(match_brace_close, '}');
single_char_matcher!(match_bracket_open, '[');
single_char_matcher!(match_bracket_close, ']');
single_char_matcher!(match_newline, '\n');

static PATTERN_TABLE: OnceLock<Vec<Pattern>> = OnceLock::new();

/// The full pattern table, highest priority first.
///
/// Priority only breaks exact length ties. The text run matcher does not
/// stop at spaces, so `FilePath`/`Url`/`Email` tokens surface only when
/// the match runs all the way to the next special character or newline;
/// with prose after them on the same line they are part of the text run.
pub(crate) fn pattern_table() -> &'static [Pattern] {
    PATTERN_TABLE.get_or_init(|| {
        vec![
            Pattern {
                kind: TokenKind::ToolCallJson,
                matcher: Matcher::Custom(match_tool_call_json),
            },
            Pattern {
                kind: TokenKind::CodeFence,
                matcher: Matcher::Regex(code_fence_regex()),
            },
            Pattern {
                kind: TokenKind::FilePath,
                matcher: Matcher::Regex(file_path_regex()),
            },
            Pattern {
                kind: TokenKind::Url,
                matcher: Matcher::Regex(url_regex()),
            },
            Pattern {
                kind: TokenKind::Email,
                matcher: Matcher::Regex(email_regex()),
            },
            Pattern {
                kind: TokenKind::BraceOpen,
                matcher: Matcher::Custom(match_brace_open),
            },
            Pattern {
                kind: TokenKind::BraceClose,
                matcher: Matcher::Custom(match_brace_close),
            },
            Pattern {
                kind: TokenKind::BracketOpen,
                matcher: Matcher::Custom(match_bracket_open),
            },
            Pattern {
                kind: TokenKind::BracketClose,
                matcher: Matcher::Custom(match_bracket_close),
            },
            Pattern {
                kind: TokenKind::MarkdownHeader,
                matcher: Matcher::Regex(md_header_regex()),
            },
            Pattern {
                kind: TokenKind::MarkdownBold,
                matcher: Matcher::Regex(md_bold_regex()),
            },
            Pattern {
                kind: TokenKind::Question,
                matcher: Matcher::Regex(question_regex()),
            },
            Pattern {
                kind: TokenKind::Command,
                matcher: Matcher::Regex(command_regex()),
            },
            Pattern {
                kind: TokenKind::Newline,
                matcher: Matcher::Custom(match_newline),
            },
            Pattern {
                kind: TokenKind::Text,
                matcher: Matcher::Custom(match_text_run),
            },
        ]
    })
}
