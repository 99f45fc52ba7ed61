use std::fmt;
use std::sync::Arc;

use crate::context::{ContextHelper, ScopedContextBind};

/// Opaque identifier the rest of the host uses to refer to a resource.
pub type HandleType = u32;

/// Host-side backing store of a [`Buffer`].
pub trait BufferStorage: Send {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `out.len()` bytes starting at `offset`. Only called with in-range spans.
    fn read(&self, offset: u64, out: &mut [u8]);

    /// Overwrites `data.len()` bytes starting at `offset`. Only called with in-range spans.
    fn write(&mut self, offset: u64, data: &[u8]);
}

/// Plain byte vector standing in for the GPU allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostShadowStorage {
    bytes: Vec<u8>,
}

impl HostShadowStorage {
    /// Zero-filled storage, or `None` if `size` does not fit the address space or cannot be
    /// allocated.
    pub fn new(size: u64) -> Option<Self> {
        let size = usize::try_from(size).ok()?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size).ok()?;
        bytes.resize(size, 0);
        Some(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl BufferStorage for HostShadowStorage {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read(&self, offset: u64, out: &mut [u8]) {
        let start = offset as usize;
        out.copy_from_slice(&self.bytes[start..start + out.len()]);
    }

    fn write(&mut self, offset: u64, data: &[u8]) {
        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }
}

/// GPU-visible buffer whose every operation runs under a fresh scoped context binding.
///
/// The binding is never held between calls. When it cannot be acquired, reads and writes are
/// skipped: the guest keeps its own shadow copy, so losing a host-side update is tolerable.
pub struct Buffer<S: BufferStorage = HostShadowStorage> {
    size: u64,
    handle: HandleType,
    helper: Arc<dyn ContextHelper>,
    storage: S,
}

impl Buffer<HostShadowStorage> {
    /// Creates a zero-filled buffer of `size` bytes.
    ///
    /// Returns `None` when the context cannot be bound.
    pub fn create(size: u64, handle: HandleType, helper: Arc<dyn ContextHelper>) -> Option<Self> {
        let _bind = bind_or_log(&*helper, handle, "create")?;
        let Some(storage) = HostShadowStorage::new(size) else {
            tracing::warn!(handle, size, "cannot allocate buffer storage");
            return None;
        };
        Some(Self {
            size,
            handle,
            helper: Arc::clone(&helper),
            storage,
        })
    }
}

impl<S: BufferStorage> Buffer<S> {
    /// Like [`Buffer::create`] with caller-supplied storage; the size is taken from it.
    pub fn create_with_storage(
        storage: S,
        handle: HandleType,
        helper: Arc<dyn ContextHelper>,
    ) -> Option<Self> {
        let _bind = bind_or_log(&*helper, handle, "create")?;
        Some(Self {
            size: storage.len(),
            handle,
            helper: Arc::clone(&helper),
            storage,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn handle(&self) -> HandleType {
        self.handle
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fills `out` from `offset`. Returns `false` (leaving `out` untouched) when the context is
    /// unavailable or the span is out of range.
    pub fn read(&self, offset: u64, out: &mut [u8]) -> bool {
        let Some(_bind) = bind_or_log(&*self.helper, self.handle, "read") else {
            return false;
        };
        if !self.span_in_range(offset, out.len(), "read") {
            return false;
        }
        self.storage.read(offset, out);
        true
    }

    /// Writes `data` at `offset`. Returns `false` (dropping the update) when the context is
    /// unavailable or the span is out of range.
    pub fn sub_update(&mut self, offset: u64, data: &[u8]) -> bool {
        let Some(_bind) = bind_or_log(&*self.helper, self.handle, "sub_update") else {
            return false;
        };
        if !self.span_in_range(offset, data.len(), "sub_update") {
            return false;
        }
        self.storage.write(offset, data);
        true
    }

    fn span_in_range(&self, offset: u64, len: usize, op: &'static str) -> bool {
        let in_range = offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= self.size);
        if !in_range {
            tracing::warn!(
                handle = self.handle,
                offset,
                len,
                size = self.size,
                op,
                "buffer access out of range; ignored"
            );
        }
        in_range
    }
}

fn bind_or_log<'a>(
    helper: &'a dyn ContextHelper,
    handle: HandleType,
    op: &'static str,
) -> Option<ScopedContextBind<'a>> {
    let bind = ScopedContextBind::acquire(helper);
    if bind.is_none() {
        tracing::debug!(handle, op, "context unavailable; buffer operation skipped");
    }
    bind
}

impl<S: BufferStorage> fmt::Debug for Buffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
