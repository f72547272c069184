use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::pin;
use tworoutine::{Bridge, BridgeError, TwoRoutine, yield_now};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejected(u32);

async fn reject(x: u32) -> Result<u32, Rejected> {
    Err(Rejected(x))
}

async fn reject_later(x: u32) -> Result<u32, Rejected> {
    yield_now().await;
    Err(Rejected(x))
}

async fn explode(_: u32) -> u32 {
    yield_now().await;
    panic!("factory exploded")
}

async fn double(x: u32) -> u32 {
    x * 2
}

#[test]
fn test_direct_call_returns_error_unmodified() {
    let wrapper = TwoRoutine::new(reject);

    assert_eq!(wrapper.call((3u32,)), Err(Rejected(3)));
    assert_eq!(TwoRoutine::new(reject_later).call((4u32,)), Err(Rejected(4)));
}

#[test]
fn test_inverted_handle_carries_the_same_error() {
    let inverted = TwoRoutine::new(reject).toggle();

    assert_eq!(
        futures::executor::block_on(inverted.call((3u32,))),
        Err(Rejected(3))
    );
    assert_eq!(inverted.call((3u32,)).resolve(), Ok(Err(Rejected(3))));
}

#[test]
fn test_computation_error_is_not_a_bridge_error() {
    let wrapper = TwoRoutine::new(reject);

    assert_eq!(wrapper.try_call((9u32,)), Ok(Err(Rejected(9))));
}

#[test]
#[should_panic(expected = "factory exploded")]
fn test_panic_propagates_through_direct_call() {
    TwoRoutine::new(explode).call((1u32,));
}

#[test]
#[should_panic(expected = "factory exploded")]
fn test_panic_propagates_through_resolve() {
    let _ = TwoRoutine::new(explode).toggle().call((1u32,)).resolve();
}

#[test]
fn test_bridge_usable_after_a_panicking_call() {
    let exploding = TwoRoutine::new(explode);
    let doubling = TwoRoutine::new(double);

    let result = catch_unwind(AssertUnwindSafe(|| exploding.call((1u32,))));
    assert!(result.is_err());

    assert_eq!(doubling.call((21u32,)), 42);
}

#[test]
fn test_resolving_twice_is_rejected() {
    let bridge = Bridge::new();
    let mut computation = pin!(TwoRoutine::new(double).toggle().call((2u32,)));

    assert_eq!(bridge.resolve_pinned(computation.as_mut()), Ok(4));
    assert_eq!(
        bridge.resolve_pinned(computation.as_mut()),
        Err(BridgeError::AlreadyResolved)
    );
}

#[test]
fn test_resolving_after_await_is_rejected() {
    let bridge = Bridge::new();
    let mut computation = pin!(TwoRoutine::new(double).toggle().call((2u32,)));

    assert_eq!(futures::executor::block_on(computation.as_mut()), 4);
    assert_eq!(
        bridge.resolve_pinned(computation.as_mut()),
        Err(BridgeError::AlreadyResolved)
    );
}

#[test]
#[should_panic(expected = "`Computation` polled after completion")]
fn test_polling_after_completion_panics() {
    let mut computation = pin!(TwoRoutine::new(double).toggle().call((2u32,)));

    futures::executor::block_on(computation.as_mut());
    futures::executor::block_on(computation.as_mut());
}

#[test]
fn test_bridge_error_messages() {
    assert_eq!(
        BridgeError::AlreadyResolved.to_string(),
        "computation has already been resolved"
    );
    assert_eq!(
        BridgeError::NestingTooDeep {
            runtime: "rt".to_owned(),
            limit: 3
        }
        .to_string(),
        "runtime `rt` reached its nesting limit of 3 drive frames"
    );
}
