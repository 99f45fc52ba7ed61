//! Futures reporting that GPU work has finished.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt, Shared};
use futures_intrusive::channel::shared::{oneshot_channel, OneshotSender};

/// Resolves once the GPU work a command triggered has completed.
///
/// Cheap to clone; every clone resolves at the same time. Dropping the paired
/// [`CompletionSignal`] without signalling also resolves it, since nothing is left to wait for.
#[derive(Clone)]
pub struct GpuCompletion {
    inner: Shared<BoxFuture<'static, ()>>,
}

impl GpuCompletion {
    /// Already complete (work that ran synchronously).
    pub fn ready() -> Self {
        Self {
            inner: futures::future::ready(()).boxed().shared(),
        }
    }

    /// An unfinished completion and the signal that finishes it.
    pub fn pending() -> (CompletionSignal, Self) {
        let (sender, receiver) = oneshot_channel::<()>();
        let inner = async move {
            let _ = receiver.receive().await;
        }
        .boxed()
        .shared();
        (CompletionSignal { sender }, Self { inner })
    }

    /// Wraps an arbitrary future, e.g. a driver fence wait.
    pub fn from_future(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// Whether the work has finished, without blocking.
    pub fn is_ready(&self) -> bool {
        self.inner.clone().now_or_never().is_some()
    }

    /// Blocks the calling thread until the work has finished.
    pub fn wait(self) {
        pollster::block_on(self)
    }
}

impl Future for GpuCompletion {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for GpuCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuCompletion")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Completes the paired [`GpuCompletion`].
pub struct CompletionSignal {
    sender: OneshotSender<()>,
}

impl CompletionSignal {
    pub fn complete(self) {
        let _ = self.sender.send(());
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal").finish_non_exhaustive()
    }
}
