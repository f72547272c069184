//! Ready queue shared between a runtime and its wakers.
//!
//! Tasks are pushed when spawned or woken and popped by the drive loop in
//! first-in-first-out order. Wakers may fire on other threads, so the queue
//! is lock-protected and every push unparks the thread that owns the runtime.

use crate::runtime::park::Unparker;
use crate::task::Task;

use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::Arc;

pub(crate) struct TaskQueue {
    queue: Mutex<VecDeque<Arc<Task>>>,
    unparker: Unparker,
}

impl TaskQueue {
    pub(crate) fn new(unparker: Unparker) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            unparker,
        }
    }

    /// Enqueues a task at the back and wakes the owning thread if it is parked.
    pub(crate) fn push(&self, task: Arc<Task>) {
        self.queue.lock().push_back(task);
        self.unparker.unpark();
    }

    pub(crate) fn pop(&self) -> Option<Arc<Task>> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Removes every queued task, used on shutdown.
    pub(crate) fn clear(&self) -> Vec<Arc<Task>> {
        self.queue.lock().drain(..).collect()
    }

    pub(crate) fn unparker(&self) -> &Unparker {
        &self.unparker
    }
}
