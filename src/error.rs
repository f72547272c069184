use thiserror::Error;

/// Failure to resolve a computation synchronously.
///
/// These are distinct from failures of the computation itself, which are
/// always handed back to the caller unmodified as the computation's output
/// (or as a panic).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The runtime driving this thread was built with reentrancy disabled and
    /// a synchronous call was made from inside its running work.
    #[error("runtime `{runtime}` is already being driven on this thread and does not allow reentrant driving")]
    ReentrancyDisabled { runtime: String },

    /// Opening another drive frame would exceed the runtime's nesting limit.
    #[error("runtime `{runtime}` reached its nesting limit of {limit} drive frames")]
    NestingTooDeep { runtime: String, limit: usize },

    /// A runtime was asked to drive a thread that another runtime is already
    /// driving.
    #[error("cannot drive runtime `{requested}` while runtime `{active}` is driving this thread")]
    ForeignRuntime { active: String, requested: String },

    /// The computation already produced its output.
    #[error("computation has already been resolved")]
    AlreadyResolved,
}
