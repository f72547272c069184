//! Fluent builder for Runtime construction.

use crate::runtime::{Core, Runtime};

const DEFAULT_NAME: &str = "runtime";
const DEFAULT_MAX_TASKS_PER_TICK: usize = 61;

/// Builder for constructing [`Runtime`] instances with a fluent API.
///
/// # Example
/// ```ignore
/// let rt = RuntimeBuilder::new()
///     .name("worker")
///     .max_nesting_depth(8)
///     .build();
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeBuilder {
    name: String,
    max_tasks_per_tick: usize,
    reentrant: bool,
    max_nesting_depth: Option<usize>,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    /// Creates a builder with the default configuration: reentrant, no
    /// nesting limit, and 61 tasks per scheduler tick.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            max_tasks_per_tick: DEFAULT_MAX_TASKS_PER_TICK,
            reentrant: true,
            max_nesting_depth: None,
        }
    }

    /// Names the runtime. The name shows up in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Caps how many ready tasks one scheduler tick runs before timers are
    /// checked and the frame's own target is re-polled. Values below 1 are
    /// raised to 1.
    pub fn max_tasks_per_tick(mut self, max: usize) -> Self {
        self.max_tasks_per_tick = max.max(1);
        self
    }

    /// Controls whether a synchronous call made while the runtime is already
    /// being driven nests a new drive frame (the default) or fails with
    /// [`BridgeError::ReentrancyDisabled`](crate::BridgeError::ReentrancyDisabled).
    pub fn reentrant(mut self, enabled: bool) -> Self {
        self.reentrant = enabled;
        self
    }

    /// Limits how many drive frames may be active at once, counting the
    /// outermost `block_on`. Values below 1 are raised to 1.
    pub fn max_nesting_depth(mut self, limit: usize) -> Self {
        self.max_nesting_depth = Some(limit.max(1));
        self
    }

    /// Builds a runtime from the current configuration.
    ///
    /// The builder can be reused to build more runtimes with the same settings.
    pub fn build(&self) -> Runtime {
        Runtime::from_core(Core::new(
            self.name.clone(),
            self.max_tasks_per_tick,
            self.reentrant,
            self.max_nesting_depth,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let builder = RuntimeBuilder::new();

        assert_eq!(builder.name, "runtime");
        assert_eq!(builder.max_tasks_per_tick, 61);
        assert!(builder.reentrant);
        assert_eq!(builder.max_nesting_depth, None);
    }

    #[test]
    fn limits_are_at_least_one() {
        let builder = RuntimeBuilder::new()
            .max_tasks_per_tick(0)
            .max_nesting_depth(0);

        assert_eq!(builder.max_tasks_per_tick, 1);
        assert_eq!(builder.max_nesting_depth, Some(1));
    }
}
