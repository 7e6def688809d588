//! Semantic element extraction: file references, questions, commands.
//!
//! Each category scans the raw text independently and appends its matches
//! in match order; categories are not merged into one position-sorted
//! stream (preserved source behavior, flagged in DESIGN.md).

use crate::ast::{
    AstNode, FileReferenceNode, LineReference, QuestionKind, QuestionNode, ReferenceType,
};

use super::patterns;

/// Radius of the context window scanned when classifying a file reference.
const CONTEXT_RADIUS: usize = 50;

/// Append file reference nodes for every path-looking match in `text`.
pub(super) fn extract_file_references(text: &str, out: &mut Vec<AstNode>) {
    for m in patterns::file_path_regex().find_iter(text) {
        let raw = m.as_str();

        // Split off a trailing :line or :line-line suffix.
        let (path, line_reference) = match patterns::path_line_suffix_regex().captures(raw) {
            Some(caps) => {
                let start = caps[1].parse::<u32>().ok();
                let end = caps.get(2).and_then(|g| g.as_str().parse::<u32>().ok());
                let suffix_len = caps.get(0).map(|g| g.as_str().len()).unwrap_or(0);
                let path = &raw[..raw.len() - suffix_len];
                (path, start.map(|s| LineReference { start: s, end }))
            }
            None => (raw, None),
        };

        let absolute = path.starts_with('/')
            || path.starts_with('\\')
            || path
                .as_bytes()
                .get(1)
                .is_some_and(|b| *b == b':' && path.as_bytes()[0].is_ascii_alphabetic());

        let reference_type = classify_reference(text, m.start(), m.end());

        out.push(AstNode::FileReference(FileReferenceNode {
            path: path.to_string(),
            absolute,
            reference_type,
            line_reference,
        }));
    }
}

/// Classify a file reference from the keywords in its surrounding text.
///
/// Scans ±50 characters around the match, lower-cased, checking keyword
/// groups in priority order; the first group with a hit wins.
fn classify_reference(text: &str, start: usize, end: usize) -> ReferenceType {
    let window_start = floor_char_boundary(text, start.saturating_sub(CONTEXT_RADIUS));
    let window_end = floor_char_boundary(text, (end + CONTEXT_RADIUS).min(text.len()));
    let window = text[window_start..window_end].to_lowercase();

    const GROUPS: &[(&[&str], ReferenceType)] = &[
        (&["creat", "new file"], ReferenceType::Create),
        (&["write", "writing", "save", "saving"], ReferenceType::Write),
        (&["read", "open", "look at"], ReferenceType::Read),
        (&["delet", "remov"], ReferenceType::Delete),
        (&["modif", "edit", "chang"], ReferenceType::Modify),
        (&["navigat", "go to"], ReferenceType::Navigate),
    ];

    for (keywords, reference_type) in GROUPS {
        if keywords.iter().any(|k| window.contains(k)) {
            return *reference_type;
        }
    }
    ReferenceType::Mention
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

/// Append question nodes for interrogative sentences ending in `?`.
pub(super) fn extract_questions(text: &str, out: &mut Vec<AstNode>) {
    for caps in patterns::question_regex().captures_iter(text) {
        let question = caps
            .get(1)
            .expect("question pattern has one capture group")
            .as_str()
            .trim()
            .to_string();
        let kind = classify_question(&question);
        out.push(AstNode::Question(QuestionNode { question, kind }));
    }
}

/// Classify a question by keyword scan, in the contract's priority order.
fn classify_question(question: &str) -> QuestionKind {
    let lower = question.to_lowercase();

    const YES_NO_STARTERS: &[&str] = &[
        "is ", "are ", "was ", "were ", "do ", "does ", "did ", "can ", "could ", "should ",
        "would ", "will ", "may ", "shall ",
    ];
    if YES_NO_STARTERS.iter().any(|s| lower.starts_with(s)) {
        return QuestionKind::YesNo;
    }
    if ["which", "choose", "option"].iter().any(|k| lower.contains(k)) {
        return QuestionKind::MultipleChoice;
    }
    if ["confirm", "sure", "ok"].iter().any(|k| lower.contains(k)) {
        return QuestionKind::Confirmation;
    }
    if ["clarify", "mean", "specifically"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return QuestionKind::Clarification;
    }
    QuestionKind::OpenEnded
}

/// Append command nodes for prompt-sigil lines (`$ …`, `> …`, `# …`).
pub(super) fn extract_commands(text: &str, out: &mut Vec<AstNode>) {
    for caps in patterns::command_regex().captures_iter(text) {
        let command = caps
            .get(1)
            .expect("command pattern has one capture group")
            .as_str()
            .trim()
            .to_string();
        out.push(AstNode::Command(crate::ast::CommandNode { command }));
    }
}
