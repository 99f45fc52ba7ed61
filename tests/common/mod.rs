#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use vgpu_host::render::post::{ComposeRequest, ScreenshotRequest};
use vgpu_host::render::{CompletionSignal, DisplayBackend, GpuCompletion};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Post(u32),
    Viewport(u32, u32),
    Compose(u32),
    Clear,
    Screenshot(u32),
    Exit,
}

/// Display backend that records calls and leaves GPU work pending until released.
#[derive(Clone, Default)]
pub struct ScriptedDisplay {
    events: Arc<Mutex<Vec<Event>>>,
    pending: Arc<Mutex<Vec<CompletionSignal>>>,
}

impl ScriptedDisplay {
    pub fn boxed(&self) -> Box<dyn DisplayBackend> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Completes all GPU work issued so far.
    pub fn finish_gpu_work(&self) -> usize {
        let signals: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
        let count = signals.len();
        for signal in signals {
            signal.complete();
        }
        count
    }

    fn pending_completion(&self) -> GpuCompletion {
        let (signal, completion) = GpuCompletion::pending();
        self.pending.lock().unwrap().push(signal);
        completion
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplayBackend for ScriptedDisplay {
    fn post(&mut self, color_buffer: u32) -> GpuCompletion {
        self.record(Event::Post(color_buffer));
        self.pending_completion()
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.record(Event::Viewport(width, height));
    }

    fn compose(&mut self, request: &ComposeRequest) -> GpuCompletion {
        self.record(Event::Compose(request.target_handle().unwrap_or_default()));
        self.pending_completion()
    }

    fn clear(&mut self) {
        self.record(Event::Clear);
    }

    fn screenshot(&mut self, request: &mut ScreenshotRequest) {
        self.record(Event::Screenshot(request.color_buffer));
        for (i, byte) in request.pixels.iter_mut().enumerate() {
            *byte = i as u8;
        }
    }

    fn exit(&mut self) {
        self.record(Event::Exit);
    }
}

/// Version 2 compose payload header: `{version, display_id, target}`.
pub fn compose_payload_v2(display_id: u32, target: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&2u32.to_le_bytes());
    payload.extend_from_slice(&display_id.to_le_bytes());
    payload.extend_from_slice(&target.to_le_bytes());
    payload.extend_from_slice(&[0; 16]);
    payload
}
