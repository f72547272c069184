use crate::error::BridgeError;
use crate::runtime::context;
use crate::runtime::core::Core;
use crate::task::JoinHandle;
use crate::time::driver::TimerKey;

use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::task::Waker;
use std::time::Instant;

/// A cheap, cloneable reference to a [`Runtime`](crate::Runtime).
///
/// Handles share the runtime's scheduler but do not own its lifetime:
/// dropping the `Runtime` shuts the scheduler down even if handles remain.
/// Like the runtime, a handle stays on the thread that created it.
#[derive(Clone)]
pub struct Handle {
    core: Rc<Core>,
}

impl Handle {
    pub(crate) fn new(core: Core) -> Self {
        Self {
            core: Rc::new(core),
        }
    }

    /// Returns the runtime driving the current thread.
    ///
    /// # Panics
    ///
    /// Panics if no drive frame is active on this thread.
    pub fn current() -> Self {
        match Self::try_current() {
            Some(handle) => handle,
            None => panic!("Handle::current() called outside of a runtime context"),
        }
    }

    /// Returns the runtime driving the current thread, if any.
    pub fn try_current() -> Option<Self> {
        context::current()
    }

    /// Returns the name of the runtime this handle points to.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Number of drive frames currently active on this runtime.
    ///
    /// `0` while idle, `1` inside `block_on`, and one more for every nested
    /// synchronous call.
    pub fn depth(&self) -> usize {
        self.core.depth()
    }

    /// Spawns a background task on this runtime.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.core.spawn(future)
    }

    /// Drives `future` to completion, nesting a new frame if this runtime is
    /// already being driven.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::ForeignRuntime`] if another runtime is driving this thread.
    /// - [`BridgeError::ReentrancyDisabled`] if this runtime is already being
    ///   driven and was built with reentrancy disabled.
    /// - [`BridgeError::NestingTooDeep`] if opening another frame would exceed
    ///   the configured nesting limit.
    pub fn drive<F: Future>(&self, future: F) -> Result<F::Output, BridgeError> {
        if let Some(active) = context::current()
            && !active.ptr_eq(self)
        {
            return Err(self.refuse(BridgeError::ForeignRuntime {
                active: active.name().to_owned(),
                requested: self.name().to_owned(),
            }));
        }

        let depth = self.depth();

        if depth > 0 && !self.core.reentrant {
            return Err(self.refuse(BridgeError::ReentrancyDisabled {
                runtime: self.name().to_owned(),
            }));
        }

        if let Some(limit) = self.core.max_nesting_depth
            && depth >= limit
        {
            return Err(self.refuse(BridgeError::NestingTooDeep {
                runtime: self.name().to_owned(),
                limit,
            }));
        }

        Ok(context::enter(self, || self.core.drive(future)))
    }

    /// Returns `true` if both handles point at the same runtime.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    fn refuse(&self, err: BridgeError) -> BridgeError {
        log::warn!("runtime `{}`: {}", self.name(), err);
        err
    }

    pub(crate) fn core(&self) -> &Core {
        &self.core
    }

    pub(crate) fn downgrade(&self) -> WeakHandle {
        WeakHandle {
            core: Rc::downgrade(&self.core),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("name", &self.name())
            .field("depth", &self.depth())
            .finish()
    }
}

/// Non-owning reference held by timer futures.
#[derive(Clone, Debug, Default)]
pub(crate) struct WeakHandle {
    core: Weak<Core>,
}

impl WeakHandle {
    pub(crate) fn register_timer(&self, deadline: Instant, waker: Waker) -> Option<TimerKey> {
        self.core
            .upgrade()
            .map(|core| core.register_timer(deadline, waker))
    }

    pub(crate) fn cancel_timer(&self, key: TimerKey) {
        if let Some(core) = self.core.upgrade() {
            core.cancel_timer(key);
        }
    }
}
