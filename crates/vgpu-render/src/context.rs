//! Scoped, thread-affine binding of the host GPU context.
//!
//! Every GPU-touching resource operation runs inside a [`ScopedContextBind`]. Binding is
//! re-entrant on the thread that already holds the context and fails fast everywhere else;
//! failure is an expected outcome that callers turn into a no-op.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Supplies scoped GPU-context binding to resources.
///
/// Implementations must be re-entrant: a thread that already holds the binding may call
/// [`setup_context`](Self::setup_context) again and must get `true`, with each successful setup
/// paired with exactly one [`teardown_context`](Self::teardown_context).
pub trait ContextHelper: Send + Sync {
    /// Binds the context to the calling thread. Returns `false` when it cannot be bound right
    /// now; that must not block.
    fn setup_context(&self) -> bool;

    fn teardown_context(&self);

    /// Whether the calling thread currently holds the binding.
    fn is_bound(&self) -> bool;
}

/// RAII binding obtained from a [`ContextHelper`]. Dropping it undoes one level of binding.
///
/// The binding belongs to the thread that acquired it, so the guard cannot leave that thread:
///
/// ```compile_fail
/// # use vgpu_render::{ContextHelper, ScopedContextBind};
/// fn unbind_elsewhere(helper: &'static dyn ContextHelper) {
///     let bind = ScopedContextBind::acquire(helper);
///     std::thread::spawn(move || drop(bind));
/// }
/// ```
#[must_use = "the context is unbound as soon as the guard is dropped"]
pub struct ScopedContextBind<'a> {
    helper: &'a dyn ContextHelper,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopedContextBind<'a> {
    /// Binds `helper`, or returns `None` if the context is unavailable.
    pub fn acquire(helper: &'a dyn ContextHelper) -> Option<Self> {
        helper.setup_context().then_some(Self {
            helper,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ScopedContextBind<'_> {
    fn drop(&mut self) {
        self.helper.teardown_context();
    }
}

impl fmt::Debug for ScopedContextBind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedContextBind").finish_non_exhaustive()
    }
}

/// Raw make-current/release primitive of a GPU context (the driver layer).
pub trait ContextBackend: Send + Sync {
    /// Makes the context current on the calling thread.
    fn make_current(&self) -> bool;

    /// Releases the context from the calling thread.
    fn release_current(&self);
}

#[derive(Debug, Default)]
struct BindingState {
    owner: Option<ThreadId>,
    depth: u32,
}

/// [`ContextHelper`] that lets one thread at a time hold a [`ContextBackend`].
///
/// The owning thread may bind recursively; the backend is only made current on the outermost
/// bind and released when the last guard goes away. Other threads get `false` immediately.
///
/// The state lock is never held across a backend call. The owner is claimed before
/// `make_current` and cleared only after `release_current` returns, so other threads keep
/// failing fast while a driver call is in flight.
pub struct ThreadAffineContext<B: ContextBackend> {
    backend: B,
    state: Mutex<BindingState>,
}

impl<B: ContextBackend> ThreadAffineContext<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(BindingState::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current recursion depth of the binding (0 when unbound).
    pub fn depth(&self) -> u32 {
        self.lock().depth
    }

    fn lock(&self) -> MutexGuard<'_, BindingState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<B: ContextBackend> ContextHelper for ThreadAffineContext<B> {
    fn setup_context(&self) -> bool {
        let current = thread::current().id();
        {
            let mut state = self.lock();
            match state.owner {
                Some(owner) if owner == current => {
                    state.depth += 1;
                    return true;
                }
                Some(_) => return false,
                None => {
                    state.owner = Some(current);
                    state.depth = 1;
                }
            }
        }

        if self.backend.make_current() {
            return true;
        }
        let mut state = self.lock();
        state.owner = None;
        state.depth = 0;
        false
    }

    fn teardown_context(&self) {
        let current = thread::current().id();
        {
            let mut state = self.lock();
            if state.owner != Some(current) || state.depth == 0 {
                tracing::error!("context teardown from a thread that does not hold the binding");
                return;
            }
            state.depth -= 1;
            if state.depth > 0 {
                return;
            }
        }

        // Depth 0 with an owner set: still claimed until the release below completes.
        self.backend.release_current();
        self.lock().owner = None;
    }

    fn is_bound(&self) -> bool {
        let state = self.lock();
        state.depth > 0 && state.owner == Some(thread::current().id())
    }
}

impl<B: ContextBackend + fmt::Debug> fmt::Debug for ThreadAffineContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ThreadAffineContext")
            .field("backend", &self.backend)
            .field("owner", &state.owner)
            .field("depth", &state.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[derive(Debug, Default)]
    struct CountingBackend {
        unavailable: AtomicBool,
        makes: AtomicU32,
        releases: AtomicU32,
    }

    impl ContextBackend for CountingBackend {
        fn make_current(&self) -> bool {
            if self.unavailable.load(Ordering::SeqCst) {
                return false;
            }
            self.makes.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn release_current(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn nested_binds_make_current_once() {
        let context = ThreadAffineContext::new(CountingBackend::default());
        {
            let _outer = ScopedContextBind::acquire(&context).unwrap();
            assert!(context.is_bound());
            {
                let _inner = ScopedContextBind::acquire(&context).unwrap();
                assert_eq!(context.depth(), 2);
            }
            assert_eq!(context.depth(), 1);
            assert_eq!(context.backend().releases.load(Ordering::SeqCst), 0);
        }
        assert!(!context.is_bound());
        assert_eq!(context.backend().makes.load(Ordering::SeqCst), 1);
        assert_eq!(context.backend().releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_threads_fail_fast_while_bound() {
        let context = Arc::new(ThreadAffineContext::new(CountingBackend::default()));
        let guard = ScopedContextBind::acquire(&*context).unwrap();

        let remote = Arc::clone(&context);
        let bound_elsewhere = std::thread::spawn(move || {
            let bind = ScopedContextBind::acquire(&*remote);
            (bind.is_some(), remote.is_bound())
        })
        .join()
        .unwrap();
        assert_eq!(bound_elsewhere, (false, false));

        drop(guard);
        let remote = Arc::clone(&context);
        let bound_after_release =
            std::thread::spawn(move || ScopedContextBind::acquire(&*remote).is_some())
                .join()
                .unwrap();
        assert!(bound_after_release);
        assert_eq!(context.depth(), 0);
    }

    /// Backend whose driver calls park until the test lets them finish.
    struct GatedBackend {
        entered: crossbeam_channel::Sender<&'static str>,
        proceed: crossbeam_channel::Receiver<()>,
    }

    impl GatedBackend {
        fn wait_for_test(&self, call: &'static str) {
            let _ = self.entered.send(call);
            let _ = self.proceed.recv_timeout(Duration::from_secs(5));
        }
    }

    impl ContextBackend for GatedBackend {
        fn make_current(&self) -> bool {
            self.wait_for_test("make_current");
            true
        }

        fn release_current(&self) {
            self.wait_for_test("release_current");
        }
    }

    #[test]
    fn other_threads_fail_fast_during_driver_calls() {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (proceed_tx, proceed_rx) = crossbeam_channel::unbounded();
        let context = Arc::new(ThreadAffineContext::new(GatedBackend {
            entered: entered_tx,
            proceed: proceed_rx,
        }));

        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let holder = {
            let context = Arc::clone(&context);
            std::thread::spawn(move || {
                let bind = ScopedContextBind::acquire(&*context);
                let _ = release_rx.recv();
                bind.is_some()
            })
        };

        let try_bind_elsewhere = || {
            let started = Instant::now();
            let bound = ScopedContextBind::acquire(&*context).is_some();
            (bound, started.elapsed())
        };

        assert_eq!(entered_rx.recv().unwrap(), "make_current");
        let (bound, elapsed) = try_bind_elsewhere();
        assert!(!bound);
        assert!(elapsed < Duration::from_secs(1), "acquire blocked for {elapsed:?}");
        proceed_tx.send(()).unwrap();

        release_tx.send(()).unwrap();
        assert_eq!(entered_rx.recv().unwrap(), "release_current");
        let (bound, elapsed) = try_bind_elsewhere();
        assert!(!bound);
        assert!(elapsed < Duration::from_secs(1), "acquire blocked for {elapsed:?}");
        proceed_tx.send(()).unwrap();

        assert!(holder.join().unwrap());
        assert_eq!(context.depth(), 0);

        // Let the bind and unbind below go straight through.
        proceed_tx.send(()).unwrap();
        proceed_tx.send(()).unwrap();
        assert!(ScopedContextBind::acquire(&*context).is_some());
    }

    #[test]
    fn backend_failure_is_reported_as_unavailable() {
        let context = ThreadAffineContext::new(CountingBackend::default());
        context.backend().unavailable.store(true, Ordering::SeqCst);
        assert!(ScopedContextBind::acquire(&context).is_none());
        assert_eq!(context.depth(), 0);
        assert!(!context.is_bound());
    }
}
