//! Parking for idle drive loops.
//!
//! A drive frame with no ready task and an un-woken target parks its thread
//! until either a waker fires or the next timer deadline passes. Wakers may be
//! invoked from any thread, so the [`Unparker`] half is `Send + Sync`.
//!
//! Each parker carries a single token:
//!
//! - [`Parker::park`] blocks unless the token is available, then consumes it.
//! - [`Unparker::unpark`] makes the token available if it was not already.
//!
//! An unpark issued before the park makes the next park return immediately,
//! and spurious wakeups are allowed; the drive loop re-checks its state after
//! every park.

use parking_lot::{Condvar, Mutex};

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::time::Duration;

/// Blocks the thread that owns a runtime.
#[derive(Debug)]
pub(crate) struct Parker {
    inner: Arc<Inner>,
}

/// Wakes the thread blocked in the associated [`Parker`].
#[derive(Clone, Debug)]
pub(crate) struct Unparker {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: AtomicUsize,
    mutex: Mutex<()>,
    condvar: Condvar,
}

const EMPTY: usize = 0;
const PARKED: usize = 1;
const NOTIFIED: usize = 2;

impl Parker {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicUsize::new(EMPTY),
                mutex: Mutex::new(()),
                condvar: Condvar::new(),
            }),
        }
    }

    pub(crate) fn unparker(&self) -> Unparker {
        Unparker {
            inner: self.inner.clone(),
        }
    }

    /// Blocks until unparked.
    pub(crate) fn park(&self) {
        self.inner.park(None);
    }

    /// Blocks until unparked or until `duration` has passed.
    pub(crate) fn park_timeout(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        self.inner.park(Some(duration));
    }
}

impl Default for Parker {
    fn default() -> Self {
        Self::new()
    }
}

impl Unparker {
    pub(crate) fn unpark(&self) {
        self.inner.unpark();
    }
}

impl Inner {
    fn park(&self, timeout: Option<Duration>) {
        // Fast path: consume a pending notification.
        if self
            .state
            .compare_exchange(NOTIFIED, EMPTY, SeqCst, SeqCst)
            .is_ok()
        {
            return;
        }

        let mut guard = self.mutex.lock();

        match self.state.compare_exchange(EMPTY, PARKED, SeqCst, SeqCst) {
            Ok(_) => {}
            Err(NOTIFIED) => {
                // Swap rather than store so this synchronizes with the latest unpark.
                let old = self.state.swap(EMPTY, SeqCst);
                debug_assert_eq!(old, NOTIFIED, "park state changed unexpectedly");

                return;
            }
            Err(actual) => panic!("inconsistent park state; actual = {}", actual),
        }

        match timeout {
            Some(duration) => {
                let _ = self.condvar.wait_for(&mut guard, duration);

                match self.state.swap(EMPTY, SeqCst) {
                    NOTIFIED | PARKED => {}
                    actual => panic!("inconsistent park_timeout state; actual = {}", actual),
                }
            }
            None => loop {
                self.condvar.wait(&mut guard);

                if self
                    .state
                    .compare_exchange(NOTIFIED, EMPTY, SeqCst, SeqCst)
                    .is_ok()
                {
                    return;
                }
            },
        }
    }

    fn unpark(&self) {
        // Always write NOTIFIED so the parked side observes writes made before this call.
        match self.state.swap(NOTIFIED, SeqCst) {
            EMPTY | NOTIFIED => return,
            PARKED => {}
            actual => panic!("inconsistent state in unpark; actual = {}", actual),
        }

        // The parked thread holds the mutex between flagging PARKED and waiting.
        drop(self.mutex.lock());

        self.condvar.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;
    use std::time::Instant;

    #[test]
    fn unpark_before_park_does_not_block() {
        let parker = Parker::new();
        parker.unparker().unpark();

        let start = Instant::now();
        parker.park();

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn park_timeout_returns_after_deadline() {
        let parker = Parker::new();

        let start = Instant::now();
        parker.park_timeout(Duration::from_millis(20));

        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_timeout_never_blocks() {
        let parker = Parker::new();

        let start = Instant::now();
        parker.park_timeout(Duration::ZERO);

        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn unpark_from_another_thread() {
        let parker = Parker::new();
        let unparker = parker.unparker();

        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            unparker.unpark();
        });

        parker.park();
        waker.join().expect("unparking thread panicked");
    }
}
