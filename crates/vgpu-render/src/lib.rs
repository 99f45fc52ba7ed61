//! Host-side render layer: context-scoped resources and the post/compose command queue.
//!
//! Everything here sits between the command decoder (which hands over validated requests) and
//! the driver layer (behind [`DisplayBackend`] and [`ContextBackend`]).

pub mod config;
pub mod post;

mod buffer;
mod completion;
mod context;
mod mapping;
mod staging;

pub use buffer::{Buffer, BufferStorage, HandleType, HostShadowStorage};
pub use completion::{CompletionSignal, GpuCompletion};
pub use config::{ConfigError, HostConfig};
pub use context::{ContextBackend, ContextHelper, ScopedContextBind, ThreadAffineContext};
pub use mapping::{HostMappingBatcher, HostMemoryMapper};
pub use post::{
    CommandProcessed, CompletionCallback, ComposeRequest, DisplayBackend, DisplayCapabilities,
    NullDisplay, PostCommand, PostQueue, PostQueueError, PostWorkerBlock, ScreenshotRequest,
};
pub use staging::StagingLayoutCache;
