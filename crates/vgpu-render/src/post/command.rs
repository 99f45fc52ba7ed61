use std::fmt;

use futures_intrusive::channel::shared::{OneshotReceiver, OneshotSender};
use vgpu_base::fatal::AbortReason;
use vgpu_base::gfx_abort;

use crate::buffer::HandleType;
use crate::completion::GpuCompletion;

/// Invoked on the post worker with the future of the GPU work the command started.
pub type CompletionCallback = Box<dyn FnOnce(GpuCompletion) + Send>;

/// Screenshots are always returned as tightly packed RGBA8.
pub const SCREENSHOT_BYTES_PER_PIXEL: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostCommandKind {
    Post,
    Viewport,
    Compose,
    Clear,
    Screenshot,
    Exit,
    Block,
}

/// A composition request as handed over by the command decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    pub version: u32,
    /// Raw composition payload; starts with a little-endian header naming the target.
    pub payload: Vec<u8>,
}

impl ComposeRequest {
    pub fn new(version: u32, payload: Vec<u8>) -> Self {
        Self { version, payload }
    }

    /// Color buffer the composition renders into.
    ///
    /// Version 1 headers are `{version, target, ...}`; later versions insert a display id
    /// before the target.
    pub fn target_handle(&self) -> Option<HandleType> {
        let offset = if self.version <= 1 { 4 } else { 8 };
        let bytes = self.payload.get(offset..offset + 4)?;
        Some(HandleType::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotRequest {
    pub color_buffer: HandleType,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    /// Destination for the RGBA8 pixels; must hold at least `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl ScreenshotRequest {
    /// A request with a zeroed pixel buffer of exactly the required size.
    pub fn new(color_buffer: HandleType, width: u32, height: u32) -> Self {
        let len = Self::required_len(width, height);
        Self {
            color_buffer,
            width,
            height,
            rotation: Rotation::Deg0,
            pixels: vec![0; usize::try_from(len).unwrap_or(0)],
        }
    }

    pub fn required_len(width: u32, height: u32) -> u64 {
        u64::from(width) * u64::from(height) * SCREENSHOT_BYTES_PER_PIXEL
    }
}

/// One unit of work for the post worker.
pub enum PostCommand {
    /// Present a color buffer.
    Post {
        color_buffer: HandleType,
        on_complete: Option<CompletionCallback>,
    },
    Viewport {
        width: u32,
        height: u32,
    },
    Compose {
        request: ComposeRequest,
        on_complete: Option<CompletionCallback>,
    },
    Clear,
    Screenshot {
        request: ScreenshotRequest,
        reply: OneshotSender<Vec<u8>>,
    },
    /// Stop the worker. Commands queued behind it are discarded.
    Exit,
    /// Signal `scheduled`, then hold the worker until `continue_signal` resolves (or its
    /// sender is dropped).
    Block {
        scheduled: OneshotSender<()>,
        continue_signal: OneshotReceiver<()>,
    },
}

impl PostCommand {
    pub fn kind(&self) -> PostCommandKind {
        match self {
            PostCommand::Post { .. } => PostCommandKind::Post,
            PostCommand::Viewport { .. } => PostCommandKind::Viewport,
            PostCommand::Compose { .. } => PostCommandKind::Compose,
            PostCommand::Clear => PostCommandKind::Clear,
            PostCommand::Screenshot { .. } => PostCommandKind::Screenshot,
            PostCommand::Exit => PostCommandKind::Exit,
            PostCommand::Block { .. } => PostCommandKind::Block,
        }
    }

    /// Aborts on commands missing what their kind requires.
    pub(crate) fn validate(&self) {
        match self {
            PostCommand::Viewport { width, height } => {
                if *width == 0 || *height == 0 {
                    gfx_abort!(
                        AbortReason::InvalidCommand,
                        "viewport dimensions must be positive: {width}x{height}"
                    );
                }
            }
            PostCommand::Compose { request, .. } => {
                if request.payload.is_empty() {
                    gfx_abort!(AbortReason::InvalidCommand, "compose command has no payload");
                }
                if request.target_handle().is_none() {
                    gfx_abort!(
                        AbortReason::InvalidCommand,
                        "compose payload of {} bytes is too short for a version {} header",
                        request.payload.len(),
                        request.version
                    );
                }
            }
            PostCommand::Screenshot { request, .. } => {
                if request.width == 0 || request.height == 0 {
                    gfx_abort!(
                        AbortReason::InvalidCommand,
                        "screenshot dimensions must be positive: {}x{}",
                        request.width,
                        request.height
                    );
                }
                let required = ScreenshotRequest::required_len(request.width, request.height);
                if (request.pixels.len() as u64) < required {
                    gfx_abort!(
                        AbortReason::InvalidCommand,
                        "screenshot buffer holds {} bytes, {required} required",
                        request.pixels.len()
                    );
                }
            }
            PostCommand::Post { .. }
            | PostCommand::Clear
            | PostCommand::Exit
            | PostCommand::Block { .. } => {}
        }
    }
}

impl fmt::Debug for PostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostCommand::Post {
                color_buffer,
                on_complete,
            } => f
                .debug_struct("Post")
                .field("color_buffer", color_buffer)
                .field("has_callback", &on_complete.is_some())
                .finish(),
            PostCommand::Viewport { width, height } => f
                .debug_struct("Viewport")
                .field("width", width)
                .field("height", height)
                .finish(),
            PostCommand::Compose {
                request,
                on_complete,
            } => f
                .debug_struct("Compose")
                .field("version", &request.version)
                .field("payload_len", &request.payload.len())
                .field("has_callback", &on_complete.is_some())
                .finish(),
            PostCommand::Screenshot { request, .. } => f
                .debug_struct("Screenshot")
                .field("color_buffer", &request.color_buffer)
                .field("width", &request.width)
                .field("height", &request.height)
                .finish_non_exhaustive(),
            other => fmt::Debug::fmt(&other.kind(), f),
        }
    }
}
