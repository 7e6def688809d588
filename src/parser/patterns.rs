//! Compiled regexes for the parser's structural and semantic passes.
//!
//! All patterns are compiled once into `OnceLock` statics. The parser scans
//! raw text (not the lexer's token stream) so that streaming responses can
//! be re-parsed from an accumulating buffer.

use std::sync::OnceLock;

use regex::Regex;

static CODE_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static FILE_PATH_REGEX: OnceLock<Regex> = OnceLock::new();
static PATH_LINE_SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static QUESTION_REGEX: OnceLock<Regex> = OnceLock::new();
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();
static FILE_NAME_COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
static BARE_FILE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
static TOOL_KEY_REGEX: OnceLock<Regex> = OnceLock::new();

/// A fenced code block: ```` ```lang\n…\n``` ````.
pub(super) fn code_block_regex() -> &'static Regex {
    CODE_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9_+#.-]*)[ \t]*\n(.*?)\n?```")
            .expect("code block pattern is valid")
    })
}

/// A file path with optional drive prefix, extension, and `:line[-line]` suffix.
pub(super) fn file_path_regex() -> &'static Regex {
    FILE_PATH_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:[A-Za-z]:)?                   # optional drive prefix
            (?:\.{1,2}[/\\]|[/\\]|~[/\\])?   # optional leading ./ ../ / ~/
            (?:[\w.@-]+[/\\])+               # separated segments
            [\w@-]+(?:\.\w+)?                # final segment, optional extension
            (?::\d+(?:-\d+)?)?               # optional :line or :line-line
            ",
        )
        .expect("file path pattern is valid")
    })
}

/// The trailing `:N` / `:N-M` line suffix of a matched path.
pub(super) fn path_line_suffix_regex() -> &'static Regex {
    PATH_LINE_SUFFIX_REGEX
        .get_or_init(|| Regex::new(r":(\d+)(?:-(\d+))?$").expect("line suffix pattern is valid"))
}

/// A sentence beginning with an interrogative word and ending in `?`.
///
/// The sentence must start the text, a line, or follow sentence-ending
/// punctuation; the capture group holds the question itself.
pub(super) fn question_regex() -> &'static Regex {
    QUESTION_REGEX.get_or_init(|| {
        Regex::new(
            r"(?mx)
            (?:^|[.!?]\s+)
            (
              (?i:who|whom|whose|what|when|where|why|how|which
                |is|are|was|were|do|does|did|can|could|should|would|will|may|shall)
              \b
              [^?\n]*
              \?
            )
            ",
        )
        .expect("question pattern is valid")
    })
}

/// A line starting with a shell prompt sigil followed by command text.
pub(super) fn command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*[$>#][ \t]+(\S[^\n]*)$").expect("command pattern is valid")
    })
}

/// A first code line naming its file in a comment: `// file: x`, `# filename: x`.
pub(super) fn file_name_comment_regex() -> &'static Regex {
    FILE_NAME_COMMENT_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?://|#|--|;|/\*)[ \t]*)?file(?:name)?:[ \t]*([\w./\\-]+)")
            .expect("file name comment pattern is valid")
    })
}

/// A first code line that is nothing but a bare `name.ext`.
pub(super) fn bare_file_name_regex() -> &'static Regex {
    BARE_FILE_NAME_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?://|#|--|;)[ \t]*)?([\w-]+\.\w{1,8})[ \t]*$")
            .expect("bare file name pattern is valid")
    })
}

/// A `"tool"` key inside a JSON object.
pub(super) fn tool_key_regex() -> &'static Regex {
    TOOL_KEY_REGEX.get_or_init(|| Regex::new(r#""tool"\s*:"#).expect("tool key pattern is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_captures_language_and_body() {
        let caps = code_block_regex()
            .captures("before ```rust\nfn x() {}\n``` after")
            .expect("block should match");
        assert_eq!(&caps[1], "rust");
        assert_eq!(&caps[2], "fn x() {}");
    }

    #[test]
    fn test_file_path_variants() {
        let re = file_path_regex();
        for path in ["src/main.rs", "./relative/path.txt", "../up/one.md", "/etc/hosts.conf"] {
            assert_eq!(re.find(path).map(|m| m.as_str()), Some(path), "failed: {path}");
        }
        assert_eq!(re.find("src/main.rs:42").map(|m| m.as_str()), Some("src/main.rs:42"));
        assert_eq!(
            re.find("C:\\Users\\dev\\app.cs").map(|m| m.as_str()),
            Some("C:\\Users\\dev\\app.cs")
        );
    }

    #[test]
    fn test_path_line_suffix() {
        let caps = path_line_suffix_regex()
            .captures("src/a.rs:10-20")
            .expect("suffix should match");
        assert_eq!(&caps[1], "10");
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some("20"));
    }

    #[test]
    fn test_question_after_sentence() {
        let text = "I finished the change. Should I run the tests now?";
        let caps = question_regex().captures(text).expect("question matches");
        assert_eq!(&caps[1], "Should I run the tests now?");
    }

    #[test]
    fn test_command_lines() {
        let text = "$ cargo build\n> dir /w\nplain line";
        let commands: Vec<&str> = command_regex()
            .captures_iter(text)
            .map(|c| c.get(1).expect("capture 1 exists").as_str())
            .collect();
        assert_eq!(commands, vec!["cargo build", "dir /w"]);
    }

    #[test]
    fn test_file_name_comment() {
        let caps = file_name_comment_regex()
            .captures("// file: src/lib.rs")
            .expect("comment form matches");
        assert_eq!(&caps[1], "src/lib.rs");

        let caps = file_name_comment_regex()
            .captures("# filename: setup.py")
            .expect("hash comment form matches");
        assert_eq!(&caps[1], "setup.py");
    }

    #[test]
    fn test_bare_file_name() {
        assert!(bare_file_name_regex().is_match("main.py"));
        assert!(bare_file_name_regex().is_match("// Cargo.toml"));
        assert!(!bare_file_name_regex().is_match("not a file name"));
    }
}
