//! Timeout combinator.
//!
//! [`timeout`] races a future against a [`Sleep`]. The inner future is polled
//! first, so a future that completes on the poll where the deadline passes
//! still counts as on time.

use crate::time::TimeError;
use crate::time::sleep::{Sleep, sleep};

use pin_project_lite::pin_project;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Wraps a future with a timeout.
///
/// Resolves to `Ok(output)` if `future` completes within `duration`, and to
/// `Err(TimeError::TimeOut)` otherwise. The inner future is dropped with the
/// `Timeout`.
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        delay: sleep(duration),
    }
}

pin_project! {
    /// Future returned by [`timeout`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct Timeout<F> {
        #[pin]
        future: F,
        delay: Sleep,
    }
}

impl<F> Timeout<F> {
    /// Returns a reference to the wrapped future.
    pub fn get_ref(&self) -> &F {
        &self.future
    }

    /// Consumes the timeout, returning the wrapped future.
    pub fn into_inner(self) -> F {
        self.future
    }
}

impl<F: Future> Future for Timeout<F> {
    type Output = Result<F::Output, TimeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(output) = this.future.poll(cx) {
            return Poll::Ready(Ok(output));
        }

        Pin::new(this.delay).poll(cx).map(|()| Err(TimeError::TimeOut))
    }
}
