//! Single-threaded runtime with reentrant driving.
//!
//! The runtime owns a FIFO ready queue of spawned tasks, a timer wheel and a
//! parker for its thread. Work only makes progress while a *drive frame* is
//! active: [`Runtime::block_on`] opens one, and a synchronous call made from
//! inside running work opens a nested one on the same runtime.
//!
//! Every frame runs the same loop:
//!
//! 1. poll the frame's target future if it was woken, returning once it is ready;
//! 2. run up to `max_tasks_per_tick` ready tasks in queue order;
//! 3. fire expired timers in deadline order;
//! 4. loop while anything is ready, otherwise park until the next timer
//!    deadline or a wake from another thread.
//!
//! Because nested frames service the shared queue and timer wheel, work that
//! was queued before a nested synchronous call keeps running (in its original
//! order) while the nested target is pending. A task whose poll opened the
//! nested frame is marked running and is never re-polled by that frame.

use crate::builder::RuntimeBuilder;
use crate::error::BridgeError;
use crate::runtime::park::Parker;
use crate::runtime::waker::TargetWaker;
use crate::runtime::{Handle, TaskQueue};
use crate::task::{JoinHandle, JoinState, Task};
use crate::time::driver::{TimerDriver, TimerKey};

use futures::FutureExt;
use futures::task::waker_ref;
use slab::Slab;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

/// A cooperative scheduler bound to the thread that built it.
///
/// `Runtime` is neither `Send` nor `Sync`: one thread drives it, and that
/// thread may re-enter it from inside its own tasks.
///
/// # Example
/// ```ignore
/// let rt = Runtime::new();
/// let value = rt.block_on(async { 40 + 2 });
/// assert_eq!(value, 42);
/// ```
pub struct Runtime {
    handle: Handle,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    pub(crate) fn from_core(core: Core) -> Self {
        log::debug!("runtime `{}`: created", core.name);

        Self {
            handle: Handle::new(core),
        }
    }

    /// Returns a handle to this runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the name given by [`RuntimeBuilder::name`].
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Spawns a background task.
    ///
    /// The task runs whenever a drive frame on this runtime services the
    /// ready queue.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.handle.spawn(future)
    }

    /// Drives `future` to completion on the current thread and returns its
    /// output.
    ///
    /// Spawned tasks and timers are serviced while the future is pending.
    /// When the outermost frame finishes, tasks that are ready get one more
    /// turn each before returning; tasks waiting on timers, or ready again
    /// after their turn, stay pending until the next drive.
    ///
    /// Calling this from inside work already driven by this runtime nests a
    /// new frame rather than deadlocking.
    ///
    /// # Panics
    ///
    /// Panics with the [`BridgeError`] message if the call cannot be driven:
    /// another runtime is driving this thread, or the runtime refuses to nest.
    /// Panics raised by the future itself propagate unchanged.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self.try_block_on(future) {
            Ok(output) => output,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`block_on`](Self::block_on), reporting bridging failures as
    /// errors instead of panicking.
    pub fn try_block_on<F: Future>(&self, future: F) -> Result<F::Output, BridgeError> {
        self.handle.drive(future)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.handle.core().shutdown();
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("name", &self.name())
            .field("core", self.handle.core())
            .finish()
    }
}

/// State shared by a runtime and its handles.
pub(crate) struct Core {
    pub(crate) name: String,
    max_tasks_per_tick: usize,
    pub(crate) reentrant: bool,
    pub(crate) max_nesting_depth: Option<usize>,
    queue: Arc<TaskQueue>,
    parker: Parker,
    timers: RefCell<TimerDriver>,
    tasks: RefCell<Slab<Arc<Task>>>,
    depth: Cell<usize>,
}

impl Core {
    pub(crate) fn new(
        name: String,
        max_tasks_per_tick: usize,
        reentrant: bool,
        max_nesting_depth: Option<usize>,
    ) -> Self {
        let parker = Parker::new();
        let queue = Arc::new(TaskQueue::new(parker.unparker()));

        Self {
            name,
            max_tasks_per_tick,
            reentrant,
            max_nesting_depth,
            queue,
            parker,
            timers: RefCell::new(TimerDriver::new()),
            tasks: RefCell::new(Slab::new()),
            depth: Cell::new(0),
        }
    }

    /// Number of drive frames currently active on this runtime.
    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let join = JoinState::new();
        let output = join.clone();
        let future = AssertUnwindSafe(future).catch_unwind();

        let task = {
            let mut tasks = self.tasks.borrow_mut();
            let entry = tasks.vacant_entry();
            let id = entry.key();
            let task = Task::new(
                id,
                Box::pin(async move {
                    // A panic stays with the task and is raised again where its handle is awaited.
                    let result = future.await;
                    if result.is_err() {
                        log::warn!("task {} panicked", id);
                    }
                    output.complete(result);
                }),
                self.queue.clone(),
            );
            entry.insert(task.clone());
            task
        };

        log::trace!("runtime `{}`: spawned task {}", self.name, task.id());
        self.queue.push(task);

        JoinHandle::new(join)
    }

    pub(crate) fn register_timer(&self, deadline: Instant, waker: Waker) -> TimerKey {
        self.timers.borrow_mut().register(deadline, waker)
    }

    pub(crate) fn cancel_timer(&self, key: TimerKey) {
        // Skipped if the wheel is busy; the stale entry then fires as a spurious wake.
        if let Ok(mut timers) = self.timers.try_borrow_mut() {
            timers.cancel(key);
        }
    }

    /// Opens a drive frame and runs it until `future` completes.
    ///
    /// The caller must already have entered this runtime's context.
    pub(crate) fn drive<F: Future>(&self, future: F) -> F::Output {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);
        let _frame = Frame(&self.depth);

        log::trace!("runtime `{}`: entering drive frame {}", self.name, depth);

        let target = TargetWaker::new(self.queue.unparker().clone());
        let waker = waker_ref(&target);
        let mut cx = Context::from_waker(&waker);
        let mut future = pin!(future);

        loop {
            if target.take_notified()
                && let Poll::Ready(output) = future.as_mut().poll(&mut cx)
            {
                if depth == 1 {
                    self.drain_ready();
                }

                log::trace!("runtime `{}`: leaving drive frame {}", self.name, depth);
                return output;
            }

            self.tick();
            self.fire_timers();

            if target.is_notified() || !self.queue.is_empty() {
                continue;
            }

            self.park();
        }
    }

    /// Runs up to `max_tasks_per_tick` ready tasks. Returns how many ran.
    fn tick(&self) -> usize {
        let mut ran = 0;

        while ran < self.max_tasks_per_tick {
            let Some(task) = self.queue.pop() else {
                break;
            };

            if task.run() {
                self.release(&task);
            }

            ran += 1;
        }

        ran
    }

    fn release(&self, task: &Task) {
        let mut tasks = self.tasks.borrow_mut();

        if tasks.contains(task.id()) {
            tasks.remove(task.id());
        }
    }

    fn fire_timers(&self) {
        let expired = self.timers.borrow_mut().take_expired(Instant::now());

        if !expired.is_empty() {
            log::trace!("runtime `{}`: firing {} timers", self.name, expired.len());
        }

        for waker in expired {
            waker.wake();
        }
    }

    /// Runs every ready task once, including tasks spawned or woken while
    /// draining. A task that is ready again after its turn stays queued for
    /// the next drive, so a task that keeps re-queuing itself cannot hold the
    /// frame open.
    fn drain_ready(&self) {
        let mut ran: Vec<Arc<Task>> = Vec::new();
        let mut deferred = Vec::new();

        while let Some(task) = self.queue.pop() {
            if ran.iter().any(|seen| Arc::ptr_eq(seen, &task)) {
                deferred.push(task);
                continue;
            }

            if task.run() {
                self.release(&task);
            }

            ran.push(task);
        }

        if !deferred.is_empty() {
            log::trace!(
                "runtime `{}`: {} tasks stay queued after drain",
                self.name,
                deferred.len()
            );
        }

        for task in deferred {
            self.queue.push(task);
        }
    }

    fn park(&self) {
        let next = self.timers.borrow().next_deadline();

        match next {
            Some(deadline) => self
                .parker
                .park_timeout(deadline.saturating_duration_since(Instant::now())),
            None => self.parker.park(),
        }
    }

    /// Drops every unfinished task on this thread and clears the timer wheel.
    pub(crate) fn shutdown(&self) {
        let queued = self.queue.clear();
        let tasks: Vec<Arc<Task>> = self.tasks.borrow_mut().drain().collect();

        log::debug!(
            "runtime `{}`: shutting down with {} unfinished tasks",
            self.name,
            tasks.len()
        );

        let futures: Vec<_> = tasks.iter().filter_map(|task| task.shutdown()).collect();
        drop(futures);
        drop(queued);

        let wakers = self.timers.borrow_mut().clear();
        drop(wakers);
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("name", &self.name)
            .field("depth", &self.depth.get())
            .field("ready", &self.queue.len())
            .field("tasks", &self.tasks.borrow().len())
            .field("timers", &self.timers.borrow().len())
            .finish()
    }
}

// Closes a drive frame, also on unwind.
struct Frame<'a>(&'a Cell<usize>);

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}
