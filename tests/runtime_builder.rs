use std::sync::{Arc, Mutex};
use std::time::Duration;
use tworoutine::time::sleep;
use tworoutine::{Handle, RuntimeBuilder, Task, yield_now};

#[test]
fn test_builder_creation() {
    let rt = RuntimeBuilder::new().build();
    drop(rt);
}

#[test]
fn test_builder_simple_future() {
    let rt = RuntimeBuilder::new().build();
    let completed = Arc::new(Mutex::new(false));
    let completed_clone = completed.clone();

    let future = async move {
        *completed_clone.lock().unwrap() = true;
    };

    rt.block_on(future);
    assert!(*completed.lock().unwrap(), "Future should have completed");
}

#[test]
fn test_builder_immediate_result() {
    let rt = RuntimeBuilder::new().build();
    let value = 42;

    let result = rt.block_on(async { value });

    assert_eq!(result, 42, "Future should return correct value");
}

#[test]
fn test_builder_multiple_instances() {
    let rt1 = RuntimeBuilder::new().name("first").build();
    let rt2 = RuntimeBuilder::new().name("second").build();

    let result1 = rt1.block_on(async { 10 });
    let result2 = rt2.block_on(async { 20 });

    assert_eq!(result1, 10);
    assert_eq!(result2, 20);
    assert_eq!(rt1.name(), "first");
    assert_eq!(rt2.name(), "second");
}

#[test]
fn test_builder_is_reusable() {
    let builder = RuntimeBuilder::new().name("pool");

    let rt1 = builder.build();
    let rt2 = builder.build();

    assert!(!rt1.handle().ptr_eq(rt2.handle()));
    assert_eq!(rt1.name(), rt2.name());
}

#[test]
fn test_builder_with_async_function() {
    let rt = RuntimeBuilder::new().build();
    let counter = Arc::new(Mutex::new(0));

    async fn increment_counter(counter: Arc<Mutex<i32>>) -> i32 {
        let mut val = counter.lock().unwrap();
        *val += 1;
        *val
    }

    let result = rt.block_on(increment_counter(counter.clone()));

    assert_eq!(result, 1, "Counter should be incremented");
    assert_eq!(*counter.lock().unwrap(), 1, "Shared counter should be 1");
}

#[test]
fn test_current_handle_inside_block_on() {
    let rt = RuntimeBuilder::new().name("current").build();

    assert!(Handle::try_current().is_none());

    let (name, depth) = rt.block_on(async {
        let handle = Handle::current();
        (handle.name().to_owned(), handle.depth())
    });

    assert_eq!(name, "current");
    assert_eq!(depth, 1);
    assert!(Handle::try_current().is_none());
    assert_eq!(rt.handle().depth(), 0);
}

#[test]
#[should_panic(expected = "Handle::current() called outside of a runtime context")]
fn test_current_handle_panics_outside_runtime() {
    Handle::current();
}

#[test]
fn test_spawn_simple_task() {
    let rt = RuntimeBuilder::new().build();
    let completed = Arc::new(Mutex::new(false));
    let completed_clone = completed.clone();

    rt.spawn(async move {
        *completed_clone.lock().unwrap() = true;
    });

    rt.block_on(async {});

    assert!(
        *completed.lock().unwrap(),
        "Spawned task should have completed"
    );
}

#[test]
fn test_spawn_multiple_tasks() {
    let rt = RuntimeBuilder::new().build();
    let counter = Arc::new(Mutex::new(0));

    for _ in 0..5 {
        let counter_clone = counter.clone();
        rt.spawn(async move {
            *counter_clone.lock().unwrap() += 1;
        });
    }

    rt.block_on(async {});

    assert_eq!(*counter.lock().unwrap(), 5, "All 5 tasks should have run");
}

#[test]
fn test_spawned_tasks_run_in_spawn_order() {
    let rt = RuntimeBuilder::new().max_tasks_per_tick(1).build();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..10 {
        let order = order.clone();
        rt.spawn(async move {
            order.lock().unwrap().push(i);
        });
    }

    rt.block_on(async {});

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_join_handle_returns_output() {
    let rt = RuntimeBuilder::new().build();

    let handle = rt.spawn(async { 6 * 7 });
    assert!(!handle.is_finished());

    let value = rt.block_on(handle);

    assert_eq!(value, 42);
}

#[test]
fn test_yield_now_interleaves_tasks() {
    let rt = RuntimeBuilder::new().build();
    let order = Arc::new(Mutex::new(Vec::new()));

    let a = order.clone();
    let b = order.clone();

    rt.block_on(async move {
        let first = Task::spawn(async move {
            a.lock().unwrap().push("a1");
            yield_now().await;
            a.lock().unwrap().push("a2");
        });

        let second = Task::spawn(async move {
            b.lock().unwrap().push("b1");
            yield_now().await;
            b.lock().unwrap().push("b2");
        });

        first.await;
        second.await;
    });

    assert_eq!(*order.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn test_pending_timer_tasks_survive_until_next_drive() {
    let rt = RuntimeBuilder::new().build();

    let handle = rt.spawn(async {
        sleep(Duration::from_millis(20)).await;
        "woke"
    });

    rt.block_on(async {});
    assert!(
        !handle.is_finished(),
        "A task waiting on a timer stays pending after block_on returns"
    );

    assert_eq!(rt.block_on(handle), "woke");
}

#[test]
fn test_wake_from_another_thread() {
    let rt = RuntimeBuilder::new().build();

    let value = rt.block_on(async {
        let (tx, rx) = futures::channel::oneshot::channel();

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send(7).unwrap();
        });

        rx.await.unwrap()
    });

    assert_eq!(value, 7);
}

#[test]
fn test_drop_runtime_drops_unfinished_tasks() {
    struct Flag(Arc<Mutex<bool>>);

    impl Drop for Flag {
        fn drop(&mut self) {
            *self.0.lock().unwrap() = true;
        }
    }

    let dropped = Arc::new(Mutex::new(false));
    let rt = RuntimeBuilder::new().build();

    let flag = Flag(dropped.clone());
    rt.spawn(async move {
        let _flag = flag;
        futures::future::pending::<()>().await;
    });
    rt.block_on(async {});

    assert!(!*dropped.lock().unwrap());
    drop(rt);
    assert!(*dropped.lock().unwrap(), "Runtime teardown drops live tasks");
}
