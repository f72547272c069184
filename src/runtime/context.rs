//! Thread-local record of the runtime driving the current thread.
//!
//! Every drive frame enters the context of its runtime for the duration of
//! the frame, so [`Task::spawn`](crate::Task::spawn), [`sleep`](crate::sleep)
//! and the synchronous bridge can find the active scheduler without an
//! explicit handle. Frames nest: the previous value is restored when a frame
//! exits, including when it unwinds.

use crate::runtime::Handle;

use std::cell::RefCell;

thread_local! {
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Returns the runtime driving this thread, if any.
pub(crate) fn current() -> Option<Handle> {
    CURRENT
        .try_with(|current| current.borrow().clone())
        .ok()
        .flatten()
}

/// Runs `function` with `handle` as the current runtime.
pub(crate) fn enter<F, R>(handle: &Handle, function: F) -> R
where
    F: FnOnce() -> R,
{
    struct Reset(Option<Handle>);

    impl Drop for Reset {
        fn drop(&mut self) {
            let previous = self.0.take();
            // The slot may already be gone while the thread is being torn down.
            let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
        }
    }

    let previous = CURRENT.with(|current| current.borrow_mut().replace(handle.clone()));
    let _reset = Reset(previous);

    function()
}
