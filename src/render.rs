//! Renderer seam.
//!
//! The pipeline does not know how blocks are drawn; it hands each block to
//! a [`BlockRenderer`] exactly once. Implementations live outside this
//! crate (a terminal widget, a transcript writer); [`CollectingRenderer`]
//! is the in-crate double used by the pipeline tests.

use parking_lot::Mutex;

use crate::block::ContentBlock;

/// Consumer of finished blocks. Called from the pipeline worker task, so
/// implementations must be thread-safe and should return quickly.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, block: &ContentBlock);
}

/// Renderer that records every block it is given, in call order.
#[derive(Debug, Default)]
pub struct CollectingRenderer {
    rendered: Mutex<Vec<ContentBlock>>,
}

impl CollectingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything rendered so far.
    pub fn rendered(&self) -> Vec<ContentBlock> {
        self.rendered.lock().clone()
    }

    pub fn rendered_ids(&self) -> Vec<String> {
        self.rendered.lock().iter().map(|b| b.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rendered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.lock().is_empty()
    }
}

impl BlockRenderer for CollectingRenderer {
    fn render(&self, block: &ContentBlock) {
        self.rendered.lock().push(block.clone());
    }
}
