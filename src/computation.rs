//! Unresolved computations handed out by inverted-mode calls.

use crate::bridge::Bridge;
use crate::error::BridgeError;

use futures::future::FusedFuture;
use pin_project_lite::pin_project;

use std::fmt;
use std::future::Future;
use std::pin::{Pin, pin};
use std::task::{Context, Poll, ready};

pin_project! {
    /// A computation that has been created but not driven.
    ///
    /// Nothing runs until the computation is polled, either by awaiting it
    /// from scheduled code or by resolving it synchronously with
    /// [`resolve`](Computation::resolve). It yields its output exactly once;
    /// afterwards it reports [`is_terminated`](FusedFuture::is_terminated)
    /// and rejects further resolution.
    #[must_use = "computations do nothing unless awaited or resolved"]
    pub struct Computation<F> {
        #[pin]
        future: F,
        finished: bool,
    }
}

impl<F> Computation<F> {
    pub(crate) fn new(future: F) -> Self {
        Self {
            future,
            finished: false,
        }
    }
}

impl<F: Future> Computation<F> {
    /// Resolves the computation synchronously through the default [`Bridge`].
    pub fn resolve(self) -> Result<F::Output, BridgeError> {
        self.resolve_with(&Bridge::default())
    }

    /// Resolves the computation synchronously through `bridge`.
    pub fn resolve_with(self, bridge: &Bridge) -> Result<F::Output, BridgeError> {
        let computation = pin!(self);
        bridge.resolve_pinned(computation)
    }
}

impl<F: Future> Future for Computation<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let this = self.project();

        if *this.finished {
            panic!("`Computation` polled after completion");
        }

        let output = ready!(this.future.poll(cx));
        *this.finished = true;

        Poll::Ready(output)
    }
}

impl<F: Future> FusedFuture for Computation<F> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<F> fmt::Debug for Computation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("finished", &self.finished)
            .finish()
    }
}
