//! The post/compose command queue.
//!
//! A [`PostQueue`] owns one worker thread and one [`DisplayBackend`]. Commands run strictly in
//! enqueue order, one at a time; the only place the worker ever waits is a `Block` command.
//! Commands that start GPU work hand a [`GpuCompletion`](crate::GpuCompletion) to their
//! callback as soon as their synchronous part is done, without waiting for the GPU.

mod command;
mod display;
mod queue;
mod stats;
mod worker;

pub use command::{
    CompletionCallback, ComposeRequest, PostCommand, PostCommandKind, Rotation,
    ScreenshotRequest, SCREENSHOT_BYTES_PER_PIXEL,
};
pub use display::{DisplayBackend, DisplayCapabilities, NullDisplay};
pub use queue::{CommandProcessed, PostQueue, PostQueueError, PostWorkerBlock};
pub use stats::{PostQueueStats, PostQueueStatsSnapshot};
