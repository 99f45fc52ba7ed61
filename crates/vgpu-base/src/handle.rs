use std::fmt;

/// The release action for a [`ManagedHandle`].
///
/// What "closing" means (an fd `close`, a Win32 `CloseHandle`, returning an id to a pool) is
/// supplied by the owner, so the ownership logic in [`ManagedHandle`] is written once.
pub trait HandleCloser {
    type Handle: Copy;

    fn close(&self, handle: Self::Handle);
}

impl<C: HandleCloser + ?Sized> HandleCloser for &C {
    type Handle = C::Handle;

    fn close(&self, handle: Self::Handle) {
        (**self).close(handle);
    }
}

/// Owns zero or one external handle and closes it exactly once.
///
/// Ownership transfer follows ordinary Rust moves:
/// - moving a wrapper leaves nothing behind to close;
/// - assigning over a wrapper that owns a handle drops (and therefore closes) the previous
///   handle before the new one is stored;
/// - [`take`](Self::take) moves the handle out of a place that must stay usable, leaving an
///   empty wrapper.
pub struct ManagedHandle<C: HandleCloser> {
    handle: Option<C::Handle>,
    closer: C,
}

impl<C: HandleCloser> ManagedHandle<C> {
    /// Takes ownership of `handle`.
    pub fn new(handle: C::Handle, closer: C) -> Self {
        Self {
            handle: Some(handle),
            closer,
        }
    }

    /// An empty wrapper; dropping it does nothing.
    pub fn empty(closer: C) -> Self {
        Self {
            handle: None,
            closer,
        }
    }

    /// Returns the owned handle without giving up ownership.
    pub fn get(&self) -> Option<C::Handle> {
        self.handle
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Gives up ownership without closing. The caller becomes responsible for the handle.
    pub fn release(&mut self) -> Option<C::Handle> {
        self.handle.take()
    }

    /// Closes the currently owned handle (if any), then takes ownership of `handle`.
    pub fn reset(&mut self, handle: Option<C::Handle>) {
        if let Some(previous) = std::mem::replace(&mut self.handle, handle) {
            self.closer.close(previous);
        }
    }

    pub fn closer(&self) -> &C {
        &self.closer
    }
}

impl<C: HandleCloser + Clone> ManagedHandle<C> {
    /// Moves the handle into a new wrapper, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        Self {
            handle: self.handle.take(),
            closer: self.closer.clone(),
        }
    }
}

impl<C: HandleCloser> Drop for ManagedHandle<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.closer.close(handle);
        }
    }
}

impl<C: HandleCloser> fmt::Debug for ManagedHandle<C>
where
    C::Handle: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedHandle")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Closes POSIX file descriptors.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FdCloser;

#[cfg(unix)]
impl HandleCloser for FdCloser {
    type Handle = std::os::fd::RawFd;

    fn close(&self, fd: Self::Handle) {
        use std::os::fd::{FromRawFd, OwnedFd};

        // SAFETY: a `ManagedHandle` is the sole owner of `fd` and calls `close` at most once
        // per handle, so no other owner can observe the descriptor after this point.
        drop(unsafe { OwnedFd::from_raw_fd(fd) });
    }
}
