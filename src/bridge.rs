//! Synchronous resolution of asynchronous computations.
//!
//! A [`Bridge`] turns a future into its output without the caller being
//! async itself. What it does depends on the thread's state:
//!
//! - No runtime is driving the thread: the bridge takes the thread's cached
//!   runtime (building one from its [`RuntimeBuilder`] if there is none or if
//!   the configuration differs), drives the future to completion on it, and
//!   then either caches the runtime again or drops it, per [`Release`].
//! - A runtime is already driving the thread, because the caller is itself
//!   running inside a task or a `block_on`: the bridge re-enters that
//!   runtime's drive loop with the future as the new target. Work queued on
//!   the outer frames keeps being serviced, in order, while the nested frame
//!   runs, and control returns to the outer frame once the target is done.
//!
//! Either way the caller gets the future's final output. Failures of the
//! computation itself are part of that output (or a panic that unwinds
//! through the call); [`BridgeError`] only reports that the bridge could not
//! drive the computation at all.

use crate::builder::RuntimeBuilder;
use crate::computation::Computation;
use crate::error::BridgeError;
use crate::runtime::{Handle, Runtime};

use futures::future::FusedFuture;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;

thread_local! {
    static THREAD_RUNTIME: RefCell<Option<Cached>> = const { RefCell::new(None) };
}

struct Cached {
    builder: RuntimeBuilder,
    runtime: Runtime,
}

/// What the bridge does with a runtime it created once a call completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Release {
    /// Keep the runtime in a thread-local slot for the next call on this
    /// thread. Tasks it still owns stay suspended until it is driven again.
    #[default]
    Reuse,
    /// Drop the runtime, and every task it still owns, after the call.
    Teardown,
}

/// Resolves futures synchronously, nesting into an active runtime when there
/// is one.
#[derive(Debug, Clone, Default)]
pub struct Bridge {
    builder: RuntimeBuilder,
    release: Release,
}

impl Bridge {
    /// Creates a bridge with the default builder that reuses its runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `builder` for runtimes this bridge creates.
    pub fn with_builder(builder: RuntimeBuilder) -> Self {
        Self {
            builder,
            release: Release::default(),
        }
    }

    /// Sets what happens to a runtime created by this bridge after a call.
    pub fn release(mut self, release: Release) -> Self {
        self.release = release;
        self
    }

    /// Returns the builder used for runtimes this bridge creates.
    pub fn builder(&self) -> &RuntimeBuilder {
        &self.builder
    }

    /// Returns the current release policy.
    pub fn release_policy(&self) -> Release {
        self.release
    }

    /// Drives `future` to completion on the current thread and returns its
    /// output.
    pub fn resolve<F: Future>(&self, future: F) -> Result<F::Output, BridgeError> {
        if let Some(handle) = Handle::try_current() {
            log::trace!(
                "bridge: nesting into runtime `{}` at depth {}",
                handle.name(),
                handle.depth()
            );
            return handle.drive(future);
        }

        let runtime = self.acquire();
        let output = runtime.try_block_on(future);
        self.recycle(runtime);

        output
    }

    /// Resolves an inverted-mode computation in place.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AlreadyResolved`] without polling anything if
    /// the computation already produced its output.
    pub fn resolve_pinned<F: Future>(
        &self,
        computation: Pin<&mut Computation<F>>,
    ) -> Result<F::Output, BridgeError> {
        if computation.is_terminated() {
            log::warn!("bridge: {}", BridgeError::AlreadyResolved);
            return Err(BridgeError::AlreadyResolved);
        }

        self.resolve(computation)
    }

    fn acquire(&self) -> Runtime {
        let cached = THREAD_RUNTIME.with(|slot| {
            let mut slot = slot.borrow_mut();

            if slot
                .as_ref()
                .is_some_and(|cached| cached.builder == self.builder)
            {
                slot.take()
            } else {
                None
            }
        });

        match cached {
            Some(cached) => {
                log::debug!("bridge: reusing runtime `{}`", cached.runtime.name());
                cached.runtime
            }
            None => {
                let runtime = self.builder.build();
                log::debug!("bridge: built runtime `{}`", runtime.name());
                runtime
            }
        }
    }

    fn recycle(&self, runtime: Runtime) {
        match self.release {
            Release::Reuse => {
                let replaced = THREAD_RUNTIME.with(|slot| {
                    slot.borrow_mut().replace(Cached {
                        builder: self.builder.clone(),
                        runtime,
                    })
                });
                // Dropped outside the borrow; its teardown may run arbitrary drops.
                drop(replaced);
            }
            Release::Teardown => {
                log::debug!("bridge: tearing down runtime `{}`", runtime.name());
                drop(runtime);
            }
        }
    }
}

/// Resolves `future` through a default [`Bridge`].
///
/// # Panics
///
/// Panics with the [`BridgeError`] message if the future cannot be driven on
/// this thread.
pub fn block_on<F: Future>(future: F) -> F::Output {
    match Bridge::default().resolve(future) {
        Ok(output) => output,
        Err(err) => panic!("{}", err),
    }
}
