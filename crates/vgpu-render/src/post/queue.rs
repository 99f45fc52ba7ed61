use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use futures_intrusive::channel::shared::{oneshot_channel, OneshotReceiver, OneshotSender};
use vgpu_base::fatal::AbortReason;
use vgpu_base::gfx_abort;

use crate::buffer::HandleType;
use crate::config::HostConfig;

use super::command::{CompletionCallback, ComposeRequest, PostCommand, ScreenshotRequest};
use super::display::{DisplayBackend, DisplayCapabilities};
use super::stats::{PostQueueStats, PostQueueStatsSnapshot};
use super::worker::{Envelope, PostWorker};

#[derive(Debug, thiserror::Error)]
pub enum PostQueueError {
    #[error("failed to spawn post worker thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("post queue is closed")]
    Closed,
}

/// Resolves once the worker has dealt with an enqueued command.
///
/// Yields `true` if the command ran and `false` if it was discarded because the queue stopped
/// first. This is distinct from the [`GpuCompletion`](crate::GpuCompletion) handed to
/// completion callbacks, which tracks the GPU work itself.
#[must_use = "dropping this does not cancel the command"]
pub struct CommandProcessed {
    receiver: OneshotReceiver<bool>,
}

impl CommandProcessed {
    pub async fn processed(self) -> bool {
        self.receiver.receive().await.unwrap_or(false)
    }

    /// Blocks until the worker has executed or discarded the command.
    pub fn wait(self) -> bool {
        pollster::block_on(self.processed())
    }
}

impl fmt::Debug for CommandProcessed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandProcessed").finish_non_exhaustive()
    }
}

/// Keeps the post worker parked on a `Block` command.
///
/// The worker resumes on [`resume`](Self::resume) or when this guard is dropped.
pub struct PostWorkerBlock {
    scheduled: Option<OneshotReceiver<()>>,
    resume: OneshotSender<()>,
    processed: CommandProcessed,
}

impl PostWorkerBlock {
    /// Waits until the worker has reached the block. Returns `false` if it never will because
    /// the queue stopped first.
    pub fn wait_scheduled(&mut self) -> bool {
        match self.scheduled.take() {
            Some(scheduled) => pollster::block_on(scheduled.receive()).is_some(),
            None => true,
        }
    }

    /// Lets the worker continue and returns the block command's processed future.
    pub fn resume(self) -> CommandProcessed {
        let _ = self.resume.send(());
        self.processed
    }
}

impl fmt::Debug for PostWorkerBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostWorkerBlock")
            .field("scheduled_pending", &self.scheduled.is_some())
            .finish_non_exhaustive()
    }
}

/// Serializes display work onto a single dedicated worker thread.
///
/// Commands execute one at a time in enqueue order. Dropping the queue enqueues `Exit` and
/// joins the worker.
pub struct PostQueue {
    sender: Option<Sender<Envelope>>,
    worker: Option<JoinHandle<()>>,
    capabilities: DisplayCapabilities,
    stats: Arc<PostQueueStats>,
}

impl PostQueue {
    pub fn new(display: Box<dyn DisplayBackend>) -> Result<Self, PostQueueError> {
        Self::with_config(display, &HostConfig::default())
    }

    pub fn with_config(
        display: Box<dyn DisplayBackend>,
        config: &HostConfig,
    ) -> Result<Self, PostQueueError> {
        let capabilities = display.capabilities();
        let stats = Arc::new(PostQueueStats::new());
        let (sender, receiver) = crossbeam_channel::unbounded();

        let worker = PostWorker::new(display, Arc::clone(&stats));
        let worker = thread::Builder::new()
            .name(config.post_thread_name.clone())
            .spawn(move || worker.run(receiver))
            .map_err(PostQueueError::Spawn)?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            capabilities,
            stats,
        })
    }

    /// Queues `command` behind everything enqueued before it.
    ///
    /// Malformed commands are a contract violation and abort on the calling thread.
    pub fn enqueue(&self, command: PostCommand) -> Result<CommandProcessed, PostQueueError> {
        command.validate();
        self.check_capabilities(&command);

        let sender = self.sender.as_ref().ok_or(PostQueueError::Closed)?;
        let (processed, receiver) = oneshot_channel();
        sender
            .send(Envelope { command, processed })
            .map_err(|_| PostQueueError::Closed)?;
        Ok(CommandProcessed { receiver })
    }

    pub fn post(
        &self,
        color_buffer: HandleType,
        on_complete: Option<CompletionCallback>,
    ) -> Result<CommandProcessed, PostQueueError> {
        self.enqueue(PostCommand::Post {
            color_buffer,
            on_complete,
        })
    }

    pub fn viewport(&self, width: u32, height: u32) -> Result<CommandProcessed, PostQueueError> {
        self.enqueue(PostCommand::Viewport { width, height })
    }

    pub fn compose(
        &self,
        version: u32,
        payload: Vec<u8>,
        on_complete: Option<CompletionCallback>,
    ) -> Result<CommandProcessed, PostQueueError> {
        self.enqueue(PostCommand::Compose {
            request: ComposeRequest::new(version, payload),
            on_complete,
        })
    }

    pub fn clear(&self) -> Result<CommandProcessed, PostQueueError> {
        self.enqueue(PostCommand::Clear)
    }

    /// Takes a screenshot and blocks until the worker returns the pixels.
    pub fn screenshot(&self, request: ScreenshotRequest) -> Result<Vec<u8>, PostQueueError> {
        let (reply, pixels) = oneshot_channel();
        let _processed = self.enqueue(PostCommand::Screenshot { request, reply })?;
        pollster::block_on(pixels.receive()).ok_or(PostQueueError::Closed)
    }

    /// Parks the worker once it reaches this point in the queue.
    pub fn block(&self) -> Result<PostWorkerBlock, PostQueueError> {
        let (scheduled_tx, scheduled_rx) = oneshot_channel();
        let (resume, continue_signal) = oneshot_channel();
        let processed = self.enqueue(PostCommand::Block {
            scheduled: scheduled_tx,
            continue_signal,
        })?;
        Ok(PostWorkerBlock {
            scheduled: Some(scheduled_rx),
            resume,
            processed,
        })
    }

    /// Queues `Exit`; the worker stops after everything queued before it.
    pub fn exit(&self) -> Result<CommandProcessed, PostQueueError> {
        self.enqueue(PostCommand::Exit)
    }

    /// Queues `Exit` if still open and waits for the worker thread to finish. Later enqueues
    /// fail with [`PostQueueError::Closed`].
    pub fn shutdown(&mut self) {
        if let Some(sender) = self.sender.take() {
            let (processed, _receiver) = oneshot_channel();
            let _ = sender.send(Envelope {
                command: PostCommand::Exit,
                processed,
            });
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("post worker thread panicked");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    pub fn capabilities(&self) -> DisplayCapabilities {
        self.capabilities
    }

    pub fn stats(&self) -> PostQueueStatsSnapshot {
        self.stats.snapshot()
    }

    fn check_capabilities(&self, command: &PostCommand) {
        match command {
            PostCommand::Clear if !self.capabilities.clear => {
                gfx_abort!(AbortReason::Other, "clear is not supported by this display");
            }
            PostCommand::Screenshot { .. } if !self.capabilities.screenshot => {
                gfx_abort!(AbortReason::Other, "screenshot is not supported by this display");
            }
            _ => {}
        }
    }
}

impl Drop for PostQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for PostQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostQueue")
            .field("closed", &self.is_closed())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
