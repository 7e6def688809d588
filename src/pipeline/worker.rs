//! Background consumer task.
//!
//! Single-consumer loop over the pipeline queue. Low-priority-number
//! complete blocks render immediately in arrival order; everything else
//! parks in a pending store keyed by id until a drain marker or queue
//! close flushes it in `(priority, id)` order. An id is handed to the
//! renderer at most once for the lifetime of the worker.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};

use crate::block::ContentBlock;
use crate::render::BlockRenderer;
use crate::sanitizer;

/// One queue entry.
pub(crate) enum WorkItem {
    Block(ContentBlock),
    /// Everything enqueued before this marker is flushed before the reply.
    Drain(oneshot::Sender<()>),
}

pub(crate) async fn run(
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
    renderer: Arc<dyn BlockRenderer>,
    finalizing: Arc<AtomicBool>,
    immediate_threshold: i32,
) {
    let mut pending: BTreeMap<String, ContentBlock> = BTreeMap::new();
    let mut rendered: HashSet<String> = HashSet::new();

    while let Some(item) = rx.recv().await {
        match item {
            WorkItem::Block(block) => {
                handle_block(
                    block,
                    &renderer,
                    &finalizing,
                    immediate_threshold,
                    &mut pending,
                    &mut rendered,
                );
            }
            WorkItem::Drain(reply) => {
                flush_pending(&mut pending, &renderer, &mut rendered, true);
                // Receiver may have given up waiting; nothing to do then.
                let _ = reply.send(());
            }
        }
    }

    // Queue closed: render what is already complete, drop the rest.
    flush_pending(&mut pending, &renderer, &mut rendered, false);
    log::debug!("pipeline worker drained, exiting");
}

fn handle_block(
    block: ContentBlock,
    renderer: &Arc<dyn BlockRenderer>,
    finalizing: &AtomicBool,
    immediate_threshold: i32,
    pending: &mut BTreeMap<String, ContentBlock>,
    rendered: &mut HashSet<String>,
) {
    let block = sanitizer::sanitize(&block);
    if block.is_empty() && !block.complete {
        log::debug!("dropping block '{}': empty after sanitization", block.id);
        return;
    }

    let immediate = !finalizing.load(Ordering::Acquire)
        && block.complete
        && block.priority < immediate_threshold;
    if immediate {
        render_once(&block, renderer, rendered);
    } else {
        // Later blocks with the same id supersede earlier ones.
        pending.insert(block.id.clone(), block);
    }
}

/// Drain the pending store in `(priority, id)` order. With `force_complete`
/// every block renders as complete; otherwise incomplete blocks are dropped.
fn flush_pending(
    pending: &mut BTreeMap<String, ContentBlock>,
    renderer: &Arc<dyn BlockRenderer>,
    rendered: &mut HashSet<String>,
    force_complete: bool,
) {
    let mut blocks: Vec<ContentBlock> = std::mem::take(pending).into_values().collect();
    blocks.sort_by(|a, b| (a.priority, &a.id).cmp(&(b.priority, &b.id)));
    for mut block in blocks {
        if force_complete {
            block.complete = true;
        } else if !block.complete {
            log::debug!("dropping incomplete block '{}' at shutdown", block.id);
            continue;
        }
        render_once(&block, renderer, rendered);
    }
}

fn render_once(
    block: &ContentBlock,
    renderer: &Arc<dyn BlockRenderer>,
    rendered: &mut HashSet<String>,
) {
    if !rendered.insert(block.id.clone()) {
        log::warn!("block '{}' was already rendered, skipping", block.id);
        return;
    }
    renderer.render(block);
}
