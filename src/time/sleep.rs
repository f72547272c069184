use crate::runtime::{Handle, WeakHandle};
use crate::time::driver::TimerKey;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Waits until `duration` has elapsed.
///
/// A zero duration completes on the first poll without touching the timer
/// wheel.
///
/// # Panics
///
/// The returned future panics when polled while no runtime is driving the
/// current thread and the deadline has not passed yet.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Waits until `deadline` is reached.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        entry: None,
    }
}

/// Future returned by [`sleep`] and [`sleep_until`].
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
    deadline: Instant,
    entry: Option<Entry>,
}

#[derive(Debug)]
struct Entry {
    runtime: WeakHandle,
    key: TimerKey,
    waker: Waker,
}

impl Sleep {
    /// Returns the instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn unregister(&mut self) {
        if let Some(entry) = self.entry.take() {
            entry.runtime.cancel_timer(entry.key);
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.is_elapsed() {
            this.unregister();
            return Poll::Ready(());
        }

        // Keep the original registration, and with it the firing order, as
        // long as the same task keeps polling.
        if let Some(entry) = &this.entry
            && entry.waker.will_wake(cx.waker())
        {
            return Poll::Pending;
        }

        let Some(handle) = Handle::try_current() else {
            panic!("sleep() called outside of a runtime context");
        };

        this.unregister();

        let runtime = handle.downgrade();
        let waker = cx.waker().clone();

        if let Some(key) = runtime.register_timer(this.deadline, waker.clone()) {
            this.entry = Some(Entry {
                runtime,
                key,
                waker,
            });
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.unregister();
    }
}
