//! Runtime subsystem modules.

pub(crate) mod context;
mod core;
mod handle;
pub(crate) mod park;
pub(crate) mod queue;
pub(crate) mod waker;
pub mod yield_now;

pub use self::core::Runtime;
pub(crate) use self::core::Core;
pub use handle::Handle;
pub(crate) use handle::WeakHandle;
pub(crate) use queue::TaskQueue;
