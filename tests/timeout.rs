use std::time::Duration;
use tworoutine::time::{TimeError, sleep, timeout};
use tworoutine::{RuntimeBuilder, Task};

#[test]
fn test_timeout_completes_before_deadline() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        let handle = Task::spawn(async {
            sleep(Duration::from_millis(10)).await;
            123
        });
        timeout(Duration::from_millis(200), handle).await
    });

    assert_eq!(result, Ok(123), "Timeout should return Ok(123)");
}

#[test]
fn test_timeout_expires() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        let handle = Task::spawn(async {
            sleep(Duration::from_millis(200)).await;
            456
        });
        timeout(Duration::from_millis(20), handle).await
    });

    assert_eq!(
        result,
        Err(TimeError::TimeOut),
        "Timeout should return an error when deadline is exceeded"
    );
}

#[test]
fn test_timeout_ready_future_wins() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(timeout(Duration::ZERO, async { "ready" }));

    assert_eq!(result, Ok("ready"));
}

#[test]
fn test_timeout_error_message() {
    assert_eq!(TimeError::TimeOut.to_string(), "deadline has elapsed");
}
