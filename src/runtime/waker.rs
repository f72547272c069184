//! Wakers used by the drive loop.
//!
//! Spawned tasks wake by re-entering the ready queue through
//! [`Task::schedule`]. The target future of a drive frame is not a task: it is
//! polled in place by the frame, so its waker only raises a flag and unparks
//! the owning thread.

use crate::runtime::park::Unparker;
use crate::task::Task;

use futures::task::ArcWake;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.schedule();
    }
}

/// Waker state for the future a drive frame is resolving.
pub(crate) struct TargetWaker {
    notified: AtomicBool,
    unparker: Unparker,
}

impl TargetWaker {
    /// Starts out notified so the frame polls its target on entry.
    pub(crate) fn new(unparker: Unparker) -> Arc<Self> {
        Arc::new(Self {
            notified: AtomicBool::new(true),
            unparker,
        })
    }

    /// Consumes a pending notification.
    pub(crate) fn take_notified(&self) -> bool {
        self.notified.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn is_notified(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }
}

impl ArcWake for TargetWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.notified.store(true, Ordering::Release);
        arc_self.unparker.unpark();
    }
}
