//! Time utilities: async sleep and timeout.
//!
//! Timers live in the wheel of the runtime driving the current thread, and
//! are serviced by every drive frame of that runtime, nested frames included.
//!
//! # Example: Timeout
//!
//! ```ignore
//! use tworoutine::time::{sleep, timeout, TimeError};
//! use std::time::Duration;
//!
//! async fn run_with_timeout() {
//!     let result = timeout(Duration::from_millis(10), async {
//!         sleep(Duration::from_millis(100)).await;
//!     }).await;
//!     assert_eq!(result, Err(TimeError::TimeOut));
//! }
//! ```

pub(crate) mod driver;
pub mod sleep;
pub mod timeout;

pub use sleep::{Sleep, sleep, sleep_until};
pub use timeout::{Timeout, timeout};

/// Errors produced by time utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The deadline passed before the wrapped future completed.
    #[error("deadline has elapsed")]
    TimeOut,
}
