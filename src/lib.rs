//! Turn raw language-model output into renderable content blocks.
//!
//! Model responses are a mix of prose, markdown, fenced code, and embedded
//! tool-invocation JSON, arriving incrementally and often malformed. This
//! crate provides the stages that make such text safe to render:
//!
//! - [`lexer`] — error-tolerant tokenizer over the raw text, with an
//!   incremental mode for streamed chunks.
//! - [`parser`] — builds a [`ast::ResponseNode`] separating tool calls,
//!   code, and prose, with semantic extraction (file references,
//!   questions, commands) and validation.
//! - [`hallucination`] — flags responses that fabricate tool results, and
//!   can scrub them.
//! - [`processor`] / [`sanitizer`] — split raw text into
//!   [`block::ContentBlock`]s and normalize them.
//! - [`pipeline`] — background worker delivering sanitized blocks to a
//!   [`render::BlockRenderer`] at most once each, in priority order.
//!
//! Every stage degrades instead of failing: unrecognized input becomes
//! tokens, text nodes, or text blocks rather than errors.

pub mod ast;
pub mod block;
pub mod error;
pub mod hallucination;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod processor;
pub mod render;
pub mod sanitizer;
pub mod token;

pub use ast::{AstNode, ResponseNode, ValidationResult};
pub use block::{ContentBlock, MessageKind};
pub use error::PipelineError;
pub use lexer::{LexOutput, Lexer, LexerState};
pub use parser::{DefaultParser, ParseContext, ResponseParser};
pub use pipeline::{ContentPipeline, PipelineConfig};
pub use render::BlockRenderer;
pub use token::{Token, TokenKind};
