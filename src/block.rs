//! Renderable content block model.
//!
//! Blocks are the unit of delivery to a [`BlockRenderer`]: a tagged payload
//! plus an identity, a render priority, and a completeness flag. Blocks are
//! value types — sanitization and priority overrides build new blocks rather
//! than mutating in place.
//!
//! [`BlockRenderer`]: crate::render::BlockRenderer

use serde::{Deserialize, Serialize};

/// Default priority for ordinary content.
pub const DEFAULT_PRIORITY: i32 = 100;
/// Default priority for system messages (rendered after content).
pub const SYSTEM_PRIORITY: i32 = 1000;

/// Severity/flavor of a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Context,
    Success,
    Error,
    Warning,
    Info,
}

/// Tagged block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPayload {
    Text {
        content: String,
    },
    Code {
        code: String,
        language: Option<String>,
    },
    SystemMessage {
        message: String,
        kind: MessageKind,
    },
}

/// One renderable unit flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Unique per pipeline; ordering tie-breaker within a priority.
    pub id: String,
    /// Lower renders first.
    pub priority: i32,
    /// Incomplete blocks are held until finalize marks them complete.
    pub complete: bool,
    #[serde(flatten)]
    pub payload: BlockPayload,
}

impl ContentBlock {
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: DEFAULT_PRIORITY,
            complete: true,
            payload: BlockPayload::Text {
                content: content.into(),
            },
        }
    }

    pub fn code(
        id: impl Into<String>,
        code: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            priority: DEFAULT_PRIORITY,
            complete: true,
            payload: BlockPayload::Code {
                code: code.into(),
                language,
            },
        }
    }

    pub fn system_message(
        id: impl Into<String>,
        message: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: id.into(),
            priority: SYSTEM_PRIORITY,
            complete: true,
            payload: BlockPayload::SystemMessage {
                message: message.into(),
                kind,
            },
        }
    }

    /// Same block with a different priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Same block with a different completeness flag.
    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// The textual payload, whichever variant carries it.
    pub fn content(&self) -> &str {
        match &self.payload {
            BlockPayload::Text { content } => content,
            BlockPayload::Code { code, .. } => code,
            BlockPayload::SystemMessage { message, .. } => message,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_defaults() {
        let text = ContentBlock::text("t-0", "hi");
        assert_eq!(text.priority, DEFAULT_PRIORITY);
        assert!(text.complete);

        let system = ContentBlock::system_message("s-0", "done", MessageKind::Success);
        assert_eq!(system.priority, SYSTEM_PRIORITY);
    }

    #[test]
    fn test_builders_do_not_touch_payload() {
        let block = ContentBlock::code("c-0", "fn main() {}", Some("rust".into()))
            .with_priority(50)
            .with_complete(false);
        assert_eq!(block.priority, 50);
        assert!(!block.complete);
        assert_eq!(block.content(), "fn main() {}");
    }

    #[test]
    fn test_serde_tagging() {
        let block = ContentBlock::text("t-1", "hello");
        let json = serde_json::to_value(&block).expect("block serializes");
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["id"], "t-1");

        let back: ContentBlock = serde_json::from_value(json).expect("block round-trips");
        assert_eq!(back, block);
    }
}
