//! Content delivery pipeline.
//!
//! [`ContentPipeline`] sits between content producers and a
//! [`BlockRenderer`]: producers enqueue raw text or ready-made blocks
//! without blocking, a spawned worker task sanitizes and renders them.
//! Completion is explicit — [`ContentPipeline::finalize`] pushes a drain
//! marker through the queue and resolves once everything enqueued before
//! it has been rendered, so callers (and tests) never guess with sleeps.

mod worker;


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::block::{BlockPayload, ContentBlock, DEFAULT_PRIORITY, MessageKind, SYSTEM_PRIORITY};
use crate::error::PipelineError;
use crate::policy;
use crate::processor;
use crate::render::BlockRenderer;

use worker::WorkItem;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Complete blocks below this priority render as they arrive instead
    /// of waiting for finalize.
    pub immediate_priority_threshold: i32,
    /// How long `shutdown` waits for the worker to drain.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            immediate_priority_threshold: 500,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

pub struct ContentPipeline {
    sender: Mutex<Option<mpsc::UnboundedSender<WorkItem>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    finalizing: Arc<AtomicBool>,
    system_seq: AtomicU64,
    config: PipelineConfig,
}

impl ContentPipeline {
    /// Spawn the worker task and start accepting content.
    pub fn new(renderer: Arc<dyn BlockRenderer>, config: PipelineConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let finalizing = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(worker::run(
            rx,
            renderer,
            finalizing.clone(),
            config.immediate_priority_threshold,
        ));
        Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
            finalizing,
            system_seq: AtomicU64::new(0),
            config,
        }
    }

    pub fn with_default_config(renderer: Arc<dyn BlockRenderer>) -> Self {
        Self::new(renderer, PipelineConfig::default())
    }

    /// Split `content` into blocks and enqueue them.
    ///
    /// A non-default `priority` is applied to text and system-message
    /// blocks; code blocks keep their own.
    pub fn add_raw_content(&self, content: &str, id_prefix: &str, priority: i32) {
        for block in processor::process(content, id_prefix) {
            let override_applies = priority != DEFAULT_PRIORITY
                && !matches!(block.payload, BlockPayload::Code { .. });
            let block = if override_applies {
                block.with_priority(priority)
            } else {
                block
            };
            self.enqueue(block);
        }
    }

    /// Enqueue one ready-made block.
    pub fn add_block(&self, block: ContentBlock) {
        self.enqueue(block);
    }

    /// Enqueue a system message; renders after content unless `priority`
    /// says otherwise.
    pub fn add_system_message(&self, message: &str, kind: MessageKind, priority: i32) {
        let seq = self.system_seq.fetch_add(1, Ordering::Relaxed);
        let block =
            ContentBlock::system_message(format!("system-{seq}"), message, kind).with_priority(priority);
        self.enqueue(block);
    }

    /// Default priority for [`Self::add_system_message`] callers.
    pub fn system_priority() -> i32 {
        SYSTEM_PRIORITY
    }

    fn enqueue(&self, block: ContentBlock) {
        if self.finalizing.load(Ordering::Acquire) {
            log::warn!(
                "ignoring block '{}': pipeline is finalizing",
                block.id
            );
            return;
        }
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(WorkItem::Block(block)).is_err() {
                    log::warn!("pipeline worker is gone, block dropped");
                }
            }
            None => log::warn!("pipeline is shut down, block dropped"),
        }
    }

    /// Stop accepting new content and render everything still pending.
    ///
    /// Resolves once every block enqueued before this call has been
    /// rendered. Safe to call more than once; later calls are no-ops that
    /// still wait for the drain.
    pub async fn finalize(&self) -> Result<(), PipelineError> {
        self.finalizing.store(true, Ordering::Release);
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let sender = self.sender.lock();
            let tx = sender.as_ref().ok_or(PipelineError::WorkerGone)?;
            tx.send(WorkItem::Drain(reply_tx))
                .map_err(|_| PipelineError::WorkerGone)?;
        }
        reply_rx
            .await
            .map_err(|_| PipelineError::FinalizeFailed("worker exited before drain".into()))
    }

    /// Close the queue and wait for the worker to drain and exit.
    pub async fn shutdown(&self) -> Result<(), PipelineError> {
        // Dropping the sender closes the queue; the worker drains and exits.
        self.sender.lock().take();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.config.shutdown_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    let err = PipelineError::FinalizeFailed(join_err.to_string());
                    if policy::strict() {
                        return Err(err);
                    }
                    log::error!("pipeline worker failed: {err}");
                }
                Err(_) => {
                    let err = PipelineError::ShutdownTimeout(self.config.shutdown_timeout);
                    if policy::strict() {
                        return Err(err);
                    }
                    log::error!("{err}");
                }
            }
        }
        Ok(())
    }
}

impl Drop for ContentPipeline {
    fn drop(&mut self) {
        // Best effort: closing the queue lets a still-running worker drain
        // on its own; we cannot await it here.
        self.sender.lock().take();
    }
}
