//! Callables that produce computations.
//!
//! A [`Factory`] is anything that can be called with an argument tuple and
//! returns a future. Every plain function or closure `Fn(A, B, ..) -> Fut`
//! with up to eight arguments is a factory over `(A, B, ..)`, so wrappers
//! are called with their arguments packed in a tuple:
//!
//! ```ignore
//! let double = TwoRoutine::new(|x: u32| async move { x * 2 });
//! assert_eq!(double.call((5,)), 10);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Produces a fresh, unstarted future for every call.
pub trait Factory<Args> {
    type Future: Future;

    fn call(&self, args: Args) -> Self::Future;
}

/// A factory with its first argument fixed to a receiver.
///
/// Created by [`TwoRoutine::bind`](crate::TwoRoutine::bind). Each call
/// passes a clone of the receiver ahead of the caller's arguments, which lets
/// a factory written as `Fn(Receiver, A, ..)` be used like a method.
pub struct Bound<F, R> {
    factory: Arc<F>,
    receiver: R,
}

impl<F, R> Bound<F, R> {
    pub(crate) fn new(factory: Arc<F>, receiver: R) -> Self {
        Self { factory, receiver }
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }
}

impl<F, R: Clone> Clone for Bound<F, R> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

impl<F, R: fmt::Debug> fmt::Debug for Bound<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}

macro_rules! factory_tuple ({ $($param:ident)* } => {
    impl<Func, Fut, $($param,)*> Factory<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Fut,
        Fut: Future,
    {
        type Future = Fut;

        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Fut {
            (self)($($param,)*)
        }
    }

    impl<Inner, Recv, $($param,)*> Factory<($($param,)*)> for Bound<Inner, Recv>
    where
        Inner: Factory<(Recv, $($param,)*)>,
        Recv: Clone,
    {
        type Future = Inner::Future;

        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Self::Future {
            Factory::call(&*self.factory, (self.receiver.clone(), $($param,)*))
        }
    }
});

factory_tuple! {}
factory_tuple! { A }
factory_tuple! { A B }
factory_tuple! { A B C }
factory_tuple! { A B C D }
factory_tuple! { A B C D E }
factory_tuple! { A B C D E F }
factory_tuple! { A B C D E F G }
factory_tuple! { A B C D E F G H }
