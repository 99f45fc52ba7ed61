use crate::buffer::HandleType;
use crate::completion::GpuCompletion;

use super::command::{ComposeRequest, ScreenshotRequest};

/// What a [`DisplayBackend`] can service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCapabilities {
    pub clear: bool,
    pub screenshot: bool,
}

impl Default for DisplayCapabilities {
    fn default() -> Self {
        Self {
            clear: true,
            screenshot: true,
        }
    }
}

/// The GPU and window-system side of each post command.
///
/// Owned by the post worker and only ever called from its thread, one command at a time.
/// Methods returning a [`GpuCompletion`] must not wait for the GPU themselves.
pub trait DisplayBackend: Send {
    fn capabilities(&self) -> DisplayCapabilities {
        DisplayCapabilities::default()
    }

    fn post(&mut self, color_buffer: HandleType) -> GpuCompletion;

    fn set_viewport(&mut self, width: u32, height: u32);

    fn compose(&mut self, request: &ComposeRequest) -> GpuCompletion;

    fn clear(&mut self);

    /// Fills `request.pixels` with the color buffer's contents.
    fn screenshot(&mut self, request: &mut ScreenshotRequest);

    /// Called once, on the worker thread, before it stops.
    fn exit(&mut self) {}
}

/// Backend with no GPU behind it: completions are immediately ready and screenshots are
/// zero-filled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayBackend for NullDisplay {
    fn post(&mut self, _color_buffer: HandleType) -> GpuCompletion {
        GpuCompletion::ready()
    }

    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    fn compose(&mut self, _request: &ComposeRequest) -> GpuCompletion {
        GpuCompletion::ready()
    }

    fn clear(&mut self) {}

    fn screenshot(&mut self, request: &mut ScreenshotRequest) {
        request.pixels.fill(0);
    }
}
