//! Timer wheel owned by each runtime.
//!
//! Timers are kept ordered by `(deadline, registration sequence)`, so expired
//! timers fire in deadline order and timers sharing a deadline fire in the
//! order they were registered. A fired timer is removed before its waker
//! runs, so no drive frame, nested or not, can fire it twice.

use std::collections::BTreeMap;
use std::task::Waker;
use std::time::Instant;

/// Identifies a registered timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerKey {
    deadline: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
pub(crate) struct TimerDriver {
    timers: BTreeMap<TimerKey, Waker>,
    next_seq: u64,
}

impl TimerDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, deadline: Instant, waker: Waker) -> TimerKey {
        let key = TimerKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.timers.insert(key, waker);
        key
    }

    pub(crate) fn cancel(&mut self, key: TimerKey) {
        self.timers.remove(&key);
    }

    /// Removes every timer whose deadline is at or before `now` and returns
    /// their wakers in firing order.
    pub(crate) fn take_expired(&mut self, now: Instant) -> Vec<Waker> {
        let pending = self.timers.split_off(&TimerKey {
            deadline: now,
            seq: u64::MAX,
        });
        let expired = std::mem::replace(&mut self.timers, pending);

        expired.into_values().collect()
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.timers.keys().next().map(|key| key.deadline)
    }

    pub(crate) fn len(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn clear(&mut self) -> Vec<Waker> {
        std::mem::take(&mut self.timers).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::task::{ArcWake, waker};
    use parking_lot::Mutex;

    use std::sync::Arc;
    use std::time::Duration;

    struct Recorder {
        id: u32,
        log: Arc<Mutex<Vec<u32>>>,
    }

    impl ArcWake for Recorder {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.log.lock().push(arc_self.id);
        }
    }

    fn recorder(id: u32, log: &Arc<Mutex<Vec<u32>>>) -> Waker {
        waker(Arc::new(Recorder {
            id,
            log: log.clone(),
        }))
    }

    #[test]
    fn expired_timers_fire_in_deadline_then_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = Instant::now();
        let mut driver = TimerDriver::new();

        driver.register(base + Duration::from_millis(3), recorder(3, &log));
        driver.register(base + Duration::from_millis(1), recorder(1, &log));
        driver.register(base + Duration::from_millis(1), recorder(2, &log));
        driver.register(base + Duration::from_millis(50), recorder(4, &log));

        for waker in driver.take_expired(base + Duration::from_millis(3)) {
            waker.wake();
        }

        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(driver.len(), 1);
        assert_eq!(driver.next_deadline(), Some(base + Duration::from_millis(50)));
    }

    #[test]
    fn fired_timers_are_removed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = Instant::now();
        let mut driver = TimerDriver::new();

        driver.register(base, recorder(1, &log));

        assert_eq!(driver.take_expired(base).len(), 1);
        assert!(driver.take_expired(base + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = Instant::now();
        let mut driver = TimerDriver::new();

        let key = driver.register(base, recorder(1, &log));
        driver.cancel(key);

        assert!(driver.take_expired(base).is_empty());
        assert_eq!(driver.next_deadline(), None);
    }
}
