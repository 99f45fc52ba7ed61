use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use futures_intrusive::channel::shared::OneshotSender;

use crate::buffer::HandleType;
use crate::completion::GpuCompletion;

use super::command::{CompletionCallback, PostCommand};
use super::display::DisplayBackend;
use super::stats::PostQueueStats;

/// A queued command plus the sender that reports whether it ran.
pub(crate) struct Envelope {
    pub(crate) command: PostCommand,
    pub(crate) processed: OneshotSender<bool>,
}

enum Flow {
    Continue,
    Stop,
}

/// State owned by the post worker thread.
pub(crate) struct PostWorker {
    display: Box<dyn DisplayBackend>,
    stats: Arc<PostQueueStats>,
    /// Latest composition per target color buffer.
    compose_targets: HashMap<HandleType, GpuCompletion>,
}

impl PostWorker {
    pub(crate) fn new(display: Box<dyn DisplayBackend>, stats: Arc<PostQueueStats>) -> Self {
        Self {
            display,
            stats,
            compose_targets: HashMap::new(),
        }
    }

    /// Executes commands in arrival order until `Exit` or until every sender is gone.
    ///
    /// Returning drops `receiver`, which discards anything still queued; the discarded
    /// commands' processed futures then resolve to `false`.
    pub(crate) fn run(mut self, receiver: Receiver<Envelope>) {
        tracing::debug!("post worker started");
        for Envelope { command, processed } in receiver.iter() {
            let flow = self.execute(command);
            let _ = processed.send(true);
            if let Flow::Stop = flow {
                break;
            }
        }
        tracing::debug!("post worker stopped");
    }

    fn execute(&mut self, command: PostCommand) -> Flow {
        let kind = command.kind();
        tracing::trace!(?kind, "executing post command");

        let flow = match command {
            PostCommand::Post {
                color_buffer,
                on_complete,
            } => {
                let completion = self.display.post(color_buffer);
                self.finish(completion, on_complete);
                Flow::Continue
            }
            PostCommand::Viewport { width, height } => {
                self.display.set_viewport(width, height);
                Flow::Continue
            }
            PostCommand::Compose {
                request,
                on_complete,
            } => {
                let target = request.target_handle();
                if let Some(target) = target {
                    self.note_compose_target(target);
                }
                let completion = self.display.compose(&request);
                if let Some(target) = target {
                    self.compose_targets.insert(target, completion.clone());
                }
                self.finish(completion, on_complete);
                Flow::Continue
            }
            PostCommand::Clear => {
                self.display.clear();
                Flow::Continue
            }
            PostCommand::Screenshot { mut request, reply } => {
                self.display.screenshot(&mut request);
                let _ = reply.send(request.pixels);
                Flow::Continue
            }
            PostCommand::Exit => {
                self.display.exit();
                Flow::Stop
            }
            PostCommand::Block {
                scheduled,
                continue_signal,
            } => {
                let _ = scheduled.send(());
                let _ = pollster::block_on(continue_signal.receive());
                Flow::Continue
            }
        };

        self.stats.record_executed(kind);
        flow
    }

    fn note_compose_target(&mut self, target: HandleType) {
        self.compose_targets
            .retain(|_, completion| !completion.is_ready());
        if self.compose_targets.contains_key(&target) {
            self.stats.inc_compose_target_busy();
            tracing::warn!(
                target,
                "composing while the last composition on this target hasn't completed"
            );
        }
    }

    fn finish(&self, completion: GpuCompletion, on_complete: Option<CompletionCallback>) {
        if let Some(callback) = on_complete {
            callback(completion);
            self.stats.inc_callbacks_invoked();
        }
    }
}
