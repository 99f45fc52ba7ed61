//! Host side of a virtual GPU: command scheduling, resource lifetime and transfer layout.
//!
//! The three workspace crates are re-exported as [`base`], [`formats`] and [`render`].
//! [`VirtualGpuHost`] wires them together the way a device model uses them: one format registry
//! built at startup, one post queue driving the display, one staging-layout cache and a
//! context helper shared by every buffer.

use std::sync::{Arc, Mutex, MutexGuard};

pub use vgpu_base as base;
pub use vgpu_formats as formats;
pub use vgpu_render as render;

use vgpu_formats::FormatRegistry;
use vgpu_render::{
    Buffer, ConfigError, ContextHelper, DisplayBackend, HandleType, HostConfig, PostQueue,
    PostQueueError, StagingLayoutCache,
};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    PostQueue(#[from] PostQueueError),
}

pub struct VirtualGpuHost {
    config: HostConfig,
    registry: Arc<FormatRegistry>,
    context: Arc<dyn ContextHelper>,
    post_queue: PostQueue,
    staging: Mutex<StagingLayoutCache>,
}

impl VirtualGpuHost {
    pub fn new(
        display: Box<dyn DisplayBackend>,
        context: Arc<dyn ContextHelper>,
        config: HostConfig,
    ) -> Result<Self, HostError> {
        let registry = Arc::new(FormatRegistry::new());
        let post_queue = PostQueue::with_config(display, &config)?;
        let staging = StagingLayoutCache::from_config(Arc::clone(&registry), &config);
        tracing::debug!(
            formats = registry.len(),
            post_thread = %config.post_thread_name,
            staging_capacity = config.staging_cache_capacity,
            "virtual GPU host started"
        );
        Ok(Self {
            config,
            registry,
            context,
            post_queue,
            staging: Mutex::new(staging),
        })
    }

    /// [`new`](Self::new) with [`HostConfig::from_env`].
    pub fn from_env(
        display: Box<dyn DisplayBackend>,
        context: Arc<dyn ContextHelper>,
    ) -> Result<Self, HostError> {
        Self::new(display, context, HostConfig::from_env()?)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    pub fn post_queue(&self) -> &PostQueue {
        &self.post_queue
    }

    /// Creates a buffer bound to the host's context, or `None` if the context is unavailable.
    pub fn create_buffer(&self, size: u64, handle: HandleType) -> Option<Buffer> {
        Buffer::create(size, handle, Arc::clone(&self.context))
    }

    /// The staging-layout cache, shared by every transfer issued through this host.
    pub fn staging(&self) -> MutexGuard<'_, StagingLayoutCache> {
        match self.staging.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
