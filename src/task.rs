//! Spawned tasks and their join handles.
//!
//! A task wraps a `'static` future so the runtime can poll it from its ready
//! queue. Tasks are created with [`Task::spawn`] (on the runtime driving the
//! current thread) or with [`Runtime::spawn`](crate::Runtime::spawn), and
//! each spawn returns a [`JoinHandle`] that resolves to the task's output.
//!
//! ```ignore
//! use tworoutine::{Runtime, Task};
//!
//! let rt = Runtime::new();
//! let answer = rt.block_on(async {
//!     let handle = Task::spawn(async { 6 * 7 });
//!     handle.await
//! });
//! assert_eq!(answer, 42);
//! ```
//!
//! # Scheduling states
//!
//! A task moves through `IDLE -> SCHEDULED -> RUNNING -> (IDLE | COMPLETE)`.
//! Only a waker moves a task from `IDLE` to `SCHEDULED`, and only then is it
//! pushed on the ready queue, so a task sits in the queue at most once. A wake
//! that lands while the task is `RUNNING` (for instance from inside a nested
//! drive frame started by the task itself) is recorded as `NOTIFIED` and the
//! task is re-queued only after its current poll returns. This is what keeps
//! two drive frames from ever polling the same future at once.

use crate::runtime::{Handle, TaskQueue};

use futures::task::waker_ref;
use parking_lot::Mutex;

use std::fmt;
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll, Waker};
use std::thread;

const IDLE: u8 = 0;
const SCHEDULED: u8 = 1;
const RUNNING: u8 = 2;
const NOTIFIED: u8 = 3;
const COMPLETE: u8 = 4;

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A unit of work owned by a runtime.
///
/// Tasks are never constructed directly; see [`Task::spawn`].
pub struct Task {
    id: usize,
    future: Mutex<Option<BoxFuture>>,
    state: AtomicU8,
    queue: Arc<TaskQueue>,
}

// The boxed future is only ever polled or dropped on the thread that owns the
// runtime: `run` is called from its drive loop, and the runtime takes every
// remaining future out on shutdown. Other threads only reach `state` and the
// queue, both of which are synchronized, through wakers.
unsafe impl Send for Task {}
unsafe impl Sync for Task {}

impl Task {
    /// Spawns a future on the runtime driving the current thread.
    ///
    /// The future starts running the next time the runtime services its
    /// ready queue, which happens while a `block_on` or a nested synchronous
    /// call is in progress.
    ///
    /// # Panics
    ///
    /// Panics if no runtime is driving the current thread.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        match Handle::try_current() {
            Some(handle) => handle.spawn(future),
            None => panic!("Task::spawn() called outside of a runtime context"),
        }
    }

    pub(crate) fn new(id: usize, future: BoxFuture, queue: Arc<TaskQueue>) -> Arc<Self> {
        Arc::new(Task {
            id,
            future: Mutex::new(Some(future)),
            state: AtomicU8::new(SCHEDULED),
            queue,
        })
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    #[cfg(test)]
    pub(crate) fn is_complete(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETE
    }

    /// Moves the task toward the ready queue. Called by its waker.
    pub(crate) fn schedule(self: &Arc<Self>) {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            let next = match current {
                IDLE => SCHEDULED,
                RUNNING => NOTIFIED,
                _ => return,
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if next == SCHEDULED {
                        self.queue.push(self.clone());
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Polls the task once. Returns `true` if this poll completed it.
    pub(crate) fn run(self: &Arc<Self>) -> bool {
        if self
            .state
            .compare_exchange(SCHEDULED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        // The lock is released before polling so a nested drive frame can
        // still touch this task's state without deadlocking.
        let Some(mut future) = self.future.lock().take() else {
            self.state.store(COMPLETE, Ordering::Release);
            return false;
        };

        let waker = waker_ref(self);
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                drop(future);
                self.state.store(COMPLETE, Ordering::Release);
                true
            }
            Poll::Pending => {
                *self.future.lock() = Some(future);

                if self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Woken while running.
                    self.state.store(SCHEDULED, Ordering::Release);
                    self.queue.push(self.clone());
                }

                false
            }
        }
    }

    /// Marks the task complete and hands back its future so the caller can
    /// drop it on the owning thread.
    pub(crate) fn shutdown(&self) -> Option<BoxFuture> {
        self.state.store(COMPLETE, Ordering::Release);
        self.future.lock().take()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.state.load(Ordering::Relaxed))
            .finish()
    }
}

enum Join<T> {
    Waiting(Option<Waker>),
    Ready(thread::Result<T>),
    Taken,
}

/// Completion slot shared by a spawned future and its [`JoinHandle`].
pub(crate) struct JoinState<T> {
    slot: Mutex<Join<T>>,
}

impl<T> JoinState<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Join::Waiting(None)),
        })
    }

    /// Stores the task's output, or the payload of the panic that ended it.
    pub(crate) fn complete(&self, value: thread::Result<T>) {
        let waiter = match std::mem::replace(&mut *self.slot.lock(), Join::Ready(value)) {
            Join::Waiting(waiter) => waiter,
            _ => None,
        };

        if let Some(waker) = waiter {
            waker.wake();
        }
    }
}

/// A future that resolves to the output of a spawned task.
///
/// Dropping the handle detaches the task; it keeps running.
///
/// # Panics
///
/// If the task panicked, awaiting its handle resumes that panic in the
/// awaiting code. The drive frame that happened to run the task is not
/// affected.
pub struct JoinHandle<T> {
    state: Arc<JoinState<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(state: Arc<JoinState<T>>) -> Self {
        Self { state }
    }

    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        !matches!(*self.state.slot.lock(), Join::Waiting(_))
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.state.slot.lock();

        match std::mem::replace(&mut *slot, Join::Taken) {
            Join::Ready(Ok(value)) => Poll::Ready(value),
            Join::Ready(Err(payload)) => {
                drop(slot);
                panic::resume_unwind(payload)
            }
            Join::Waiting(_) => {
                *slot = Join::Waiting(Some(cx.waker().clone()));
                Poll::Pending
            }
            Join::Taken => panic!("JoinHandle polled after completion"),
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
