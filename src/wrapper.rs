//! The dual-mode wrapper.
//!
//! A [`TwoRoutine`] wraps a [`Factory`] and exposes it in one of two modes,
//! tracked in the type:
//!
//! - [`Direct`]: `call` resolves the computation synchronously through a
//!   [`Bridge`] and returns its output. Meant for plain synchronous code.
//! - [`Inverted`]: `call` returns the [`Computation`] unresolved. Meant for
//!   code that is already scheduled and will await it.
//!
//! [`toggle`](TwoRoutine::toggle) (or `!`) flips between the two without
//! calling the factory.

use crate::bridge::Bridge;
use crate::computation::Computation;
use crate::error::BridgeError;
use crate::factory::{Bound, Factory};

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::ops::Not;
use std::sync::Arc;

/// Call mode of a [`TwoRoutine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Direct,
    Inverted,
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level call mode. Implemented by [`Direct`] and [`Inverted`] only.
pub trait CallMode: sealed::Sealed {
    const MODE: Mode;

    /// The opposite mode.
    type Toggled: CallMode;
}

/// `call` resolves synchronously and returns the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Direct;

/// `call` returns the computation unresolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Inverted;

impl sealed::Sealed for Direct {}
impl sealed::Sealed for Inverted {}

impl CallMode for Direct {
    const MODE: Mode = Mode::Direct;
    type Toggled = Inverted;
}

impl CallMode for Inverted {
    const MODE: Mode = Mode::Inverted;
    type Toggled = Direct;
}

/// A computation factory callable either synchronously or asynchronously.
///
/// # Example
/// ```ignore
/// use tworoutine::TwoRoutine;
///
/// let double = TwoRoutine::new(|x: u32| async move { x * 2 });
///
/// // Synchronous caller.
/// assert_eq!(double.call((5,)), 10);
///
/// // Scheduled caller.
/// let computation = double.toggle().call((5,));
/// assert_eq!(computation.resolve(), Ok(10));
/// ```
pub struct TwoRoutine<F, M = Direct> {
    factory: Arc<F>,
    bridge: Bridge,
    mode: PhantomData<M>,
}

impl<F> TwoRoutine<F, Direct> {
    /// Wraps `factory` in direct mode, resolving through the default bridge.
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            bridge: Bridge::default(),
            mode: PhantomData,
        }
    }
}

impl<F, M: CallMode> TwoRoutine<F, M> {
    /// Resolves direct-mode calls through `bridge`.
    pub fn with_bridge(mut self, bridge: Bridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn mode(&self) -> Mode {
        M::MODE
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns a wrapper over the same factory in the opposite mode.
    ///
    /// The factory is shared, not called.
    pub fn toggle(&self) -> TwoRoutine<F, M::Toggled> {
        TwoRoutine {
            factory: self.factory.clone(),
            bridge: self.bridge.clone(),
            mode: PhantomData,
        }
    }

    /// Fixes the factory's first argument to `receiver`, keeping the mode.
    pub fn bind<R>(&self, receiver: R) -> TwoRoutine<Bound<F, R>, M> {
        TwoRoutine {
            factory: Arc::new(Bound::new(self.factory.clone(), receiver)),
            bridge: self.bridge.clone(),
            mode: PhantomData,
        }
    }
}

impl<F> TwoRoutine<F, Direct> {
    /// Runs the computation for `args` to completion and returns its output.
    ///
    /// # Panics
    ///
    /// Panics with the [`BridgeError`] message if the bridge cannot drive the
    /// computation; see [`try_call`](Self::try_call). Panics raised by the
    /// computation propagate unchanged.
    pub fn call<Args>(&self, args: Args) -> <F::Future as Future>::Output
    where
        F: Factory<Args>,
    {
        match self.try_call(args) {
            Ok(output) => output,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`call`](Self::call), returning bridging failures as errors.
    pub fn try_call<Args>(&self, args: Args) -> Result<<F::Future as Future>::Output, BridgeError>
    where
        F: Factory<Args>,
    {
        self.bridge.resolve(Factory::call(&*self.factory, args))
    }
}

impl<F> TwoRoutine<F, Inverted> {
    /// Creates the computation for `args` without driving it.
    pub fn call<Args>(&self, args: Args) -> Computation<F::Future>
    where
        F: Factory<Args>,
    {
        Computation::new(Factory::call(&*self.factory, args))
    }
}

impl<F, M: CallMode> Not for TwoRoutine<F, M> {
    type Output = TwoRoutine<F, M::Toggled>;

    fn not(self) -> Self::Output {
        self.toggle()
    }
}

impl<F, M: CallMode> Not for &TwoRoutine<F, M> {
    type Output = TwoRoutine<F, M::Toggled>;

    fn not(self) -> Self::Output {
        self.toggle()
    }
}

impl<F, M> Clone for TwoRoutine<F, M> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            bridge: self.bridge.clone(),
            mode: PhantomData,
        }
    }
}

impl<F, M: CallMode> fmt::Debug for TwoRoutine<F, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoRoutine")
            .field("mode", &M::MODE)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
