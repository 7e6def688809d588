//! Raw text to content blocks.
//!
//! Splits model output into [`ContentBlock`]s by scanning fenced code
//! regions line by line with a nesting depth counter, so a fence that
//! itself contains fenced snippets (a markdown example quoting code)
//! survives as one region. Fences whose language is `markdown` are
//! re-processed recursively and their blocks spliced into the output.

use crate::block::{BlockPayload, ContentBlock};

/// Split `raw` into text and code blocks.
///
/// Block ids are `{id_prefix}-{counter}` with a counter shared across
/// recursive markdown expansion, so every id in the returned vec is unique.
/// Whitespace-only blocks are dropped.
pub fn process(raw: &str, id_prefix: &str) -> Vec<ContentBlock> {
    let mut counter: u64 = 0;
    process_inner(raw, id_prefix, &mut counter)
}

fn process_inner(raw: &str, id_prefix: &str, counter: &mut u64) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut text = String::new();
    // Some(..) while inside a fence; depth counts nested openers.
    let mut fence: Option<(Option<String>, String, usize)> = None;

    for line in raw.split_inclusive('\n') {
        let stripped = line.trim_start();
        if let Some(rest) = stripped.strip_prefix("```") {
            let label = rest.trim();
            match fence.as_mut() {
                None => {
                    flush_text(&mut blocks, &mut text, id_prefix, counter);
                    let language = if label.is_empty() {
                        None
                    } else {
                        Some(label.to_lowercase())
                    };
                    fence = Some((language, String::new(), 1));
                }
                Some((_, body, depth)) => {
                    if label.is_empty() {
                        *depth -= 1;
                        if *depth == 0 {
                            let (language, body, _) =
                                fence.take().expect("fence is open here");
                            emit_fence(&mut blocks, language, body, id_prefix, counter);
                        } else {
                            body.push_str(line);
                        }
                    } else {
                        // Nested opener inside the fence body.
                        *depth += 1;
                        body.push_str(line);
                    }
                }
            }
        } else {
            match fence.as_mut() {
                Some((_, body, _)) => body.push_str(line),
                None => text.push_str(line),
            }
        }
    }

    flush_text(&mut blocks, &mut text, id_prefix, counter);
    // Unterminated fence at end of input: keep what we have as code.
    if let Some((language, body, _)) = fence.take() {
        log::debug!("unterminated code fence at end of input");
        emit_fence(&mut blocks, language, body, id_prefix, counter);
    }

    blocks
}

fn flush_text(
    blocks: &mut Vec<ContentBlock>,
    text: &mut String,
    id_prefix: &str,
    counter: &mut u64,
) {
    if text.trim().is_empty() {
        text.clear();
        return;
    }
    let id = next_id(id_prefix, counter);
    blocks.push(ContentBlock::text(id, std::mem::take(text)));
}

fn emit_fence(
    blocks: &mut Vec<ContentBlock>,
    language: Option<String>,
    body: String,
    id_prefix: &str,
    counter: &mut u64,
) {
    if body.trim().is_empty() {
        return;
    }
    if language.as_deref() == Some("markdown") {
        // Markdown fences are presentation wrappers; splice their blocks in.
        blocks.extend(process_inner(&body, id_prefix, counter));
        return;
    }
    let id = next_id(id_prefix, counter);
    let body = body.strip_suffix('\n').unwrap_or(&body).to_string();
    blocks.push(ContentBlock::code(id, body, language));
}

fn next_id(id_prefix: &str, counter: &mut u64) -> String {
    let id = format!("{id_prefix}-{counter}");
    *counter += 1;
    id
}

/// Convenience for tests and callers inspecting output shape.
pub fn payload_kind(block: &ContentBlock) -> &'static str {
    match block.payload {
        BlockPayload::Text { .. } => "text",
        BlockPayload::Code { .. } => "code",
        BlockPayload::SystemMessage { .. } => "system_message",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(blocks: &[ContentBlock]) -> Vec<&'static str> {
        blocks.iter().map(payload_kind).collect()
    }

    #[test]
    fn test_plain_text_single_block() {
        let blocks = process("just some prose\nover two lines", "msg");
        assert_eq!(kinds(&blocks), ["text"]);
        assert_eq!(blocks[0].id, "msg-0");
        assert_eq!(blocks[0].content(), "just some prose\nover two lines");
    }

    #[test]
    fn test_text_code_text_split() {
        let blocks = process("before\n```rust\nfn main() {}\n```\nafter", "msg");
        assert_eq!(kinds(&blocks), ["text", "code", "text"]);
        match &blocks[1].payload {
            BlockPayload::Code { code, language } => {
                assert_eq!(code, "fn main() {}");
                assert_eq!(language.as_deref(), Some("rust"));
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert_eq!(blocks[2].content(), "after");
    }

    #[test]
    fn test_ids_are_sequential_per_prefix() {
        let blocks = process("a\n```sh\nls\n```\nb", "p");
        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["p-0", "p-1", "p-2"]);
    }

    #[test]
    fn test_whitespace_only_segments_dropped() {
        let blocks = process("\n  \n```sh\nls\n```\n   \n", "msg");
        assert_eq!(kinds(&blocks), ["code"]);
    }

    #[test]
    fn test_nested_fence_stays_inside_outer_block() {
        // The inner pair nests: its opener bumps the depth, its closer only
        // brings it back to 1, so the region runs to the final bare fence.
        let raw = "```text\nouter\n```inner\nnested\n```\nouter again\n```";
        let blocks = process(raw, "msg");
        assert_eq!(kinds(&blocks), ["code"]);
        assert!(blocks[0].content().contains("```inner"));
        assert!(blocks[0].content().contains("outer again"));
    }

    #[test]
    fn test_markdown_fence_is_recursed_and_spliced() {
        let raw = "intro\n```markdown\nSome prose.\n```python\nprint(1)\n```\n```\ntail";
        let blocks = process(raw, "msg");
        assert_eq!(kinds(&blocks), ["text", "text", "code", "text"]);
        match &blocks[2].payload {
            BlockPayload::Code { language, code } => {
                assert_eq!(language.as_deref(), Some("python"));
                assert_eq!(code, "print(1)");
            }
            other => panic!("expected python code, got {other:?}"),
        }
        // Counter is shared across the recursion: ids never collide.
        let mut ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), blocks.len());
    }

    #[test]
    fn test_unterminated_fence_becomes_code() {
        let blocks = process("text\n```python\nprint('hi')", "msg");
        assert_eq!(kinds(&blocks), ["text", "code"]);
        assert_eq!(blocks[1].content(), "print('hi')");
    }

    #[test]
    fn test_language_is_lowercased() {
        let blocks = process("```Rust\nlet x = 1;\n```", "msg");
        match &blocks[0].payload {
            BlockPayload::Code { language, .. } => {
                assert_eq!(language.as_deref(), Some("rust"));
            }
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_rejoin_preserves_content() {
        let raw = "alpha\n```sh\necho hi\n```\nomega\n";
        let blocks = process(raw, "msg");
        let rejoined: String = blocks
            .iter()
            .map(|b| b.content().trim())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(rejoined, "alpha\necho hi\nomega");
    }
}
