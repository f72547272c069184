//! Dual-mode asynchronous callables and a reentrant synchronous bridge.
//!
//! A [`TwoRoutine`] wraps a factory of futures so the same logic can be
//! called from plain synchronous code, which blocks until the output is
//! ready, and from scheduled code, which receives an unresolved
//! [`Computation`] to await. Synchronous calls go through a [`Bridge`],
//! which works whether or not a scheduler is already driving the calling
//! thread: if one is, the bridge re-enters that scheduler's drive loop
//! instead of deadlocking against it.
//!
//! # Architecture
//!
//! - **TwoRoutine**: typestate wrapper, [`Direct`] or [`Inverted`] mode
//! - **Factory**: callables producing one fresh future per call
//! - **Computation**: single-use handle returned by inverted calls
//! - **Bridge**: synchronous resolution with a thread-cached runtime
//! - **Runtime**: single-threaded scheduler with reentrant drive frames
//! - **RuntimeBuilder**: fluent runtime configuration
//! - **Task**: spawned futures and their join handles
//! - **time**: sleep and timeout on the runtime's timer wheel
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tworoutine::{TwoRoutine, time::sleep};
//!
//! let double = TwoRoutine::new(|x: u32| async move {
//!     sleep(Duration::from_millis(10)).await;
//!     x * 2
//! });
//!
//! assert_eq!(double.call((5,)), 10);
//! ```

mod bridge;
mod builder;
mod computation;
mod error;
mod factory;
mod runtime;
mod task;
pub mod time;
mod wrapper;

pub use bridge::{Bridge, Release, block_on};
pub use builder::RuntimeBuilder;
pub use computation::Computation;
pub use error::BridgeError;
pub use factory::{Bound, Factory};
pub use runtime::yield_now::{YieldNow, yield_now};
pub use runtime::{Handle, Runtime};
pub use task::{JoinHandle, Task};
pub use wrapper::{CallMode, Direct, Inverted, Mode, TwoRoutine};
