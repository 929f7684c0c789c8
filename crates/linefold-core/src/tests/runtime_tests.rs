use crate::{DefaultScheduler, DispatchError, Runtime, RuntimeScheduler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct CountingScheduler {
    frames: AtomicUsize,
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

fn pump_until<F: Fn() -> bool>(runtime: &Runtime, done: F) {
    for _ in 0..10_000 {
        runtime.drain_ui();
        if done() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("runtime never reached the expected state");
}

#[test]
fn local_tasks_run_on_drain_in_order() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let log = Rc::new(RefCell::new(Vec::new()));

    for i in 0..3 {
        let log = log.clone();
        handle.enqueue_ui_task(Box::new(move || log.borrow_mut().push(i)));
    }
    assert!(runtime.needs_frame());
    assert!(log.borrow().is_empty());

    runtime.drain_ui();
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
    assert!(!runtime.needs_frame());
}

#[test]
fn tasks_enqueued_while_draining_run_in_same_drain() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let ran = Rc::new(Cell::new(0));

    {
        let ran = ran.clone();
        let nested = handle.clone();
        handle.enqueue_ui_task(Box::new(move || {
            ran.set(ran.get() + 1);
            let ran = ran.clone();
            nested.enqueue_ui_task(Box::new(move || ran.set(ran.get() + 10)));
        }));
    }

    runtime.drain_ui();
    assert_eq!(ran.get(), 11);
}

#[test]
fn posting_from_another_thread_schedules_a_frame() {
    let scheduler = Arc::new(CountingScheduler::default());
    let runtime = Runtime::new(scheduler.clone());
    let dispatcher = runtime.dispatcher();
    let counter = Arc::new(AtomicUsize::new(0));

    let worker_counter = counter.clone();
    thread::spawn(move || {
        dispatcher.post(move || {
            worker_counter.fetch_add(1, Ordering::SeqCst);
        });
    })
    .join()
    .expect("worker thread");

    assert!(scheduler.frames.load(Ordering::SeqCst) >= 1);
    assert!(runtime.needs_frame());
    runtime.drain_ui();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(!runtime.dispatcher().has_pending());
}

#[test]
fn endpoint_call_from_worker_blocks_until_owner_drains() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let seen = Rc::new(Cell::new(0u32));

    let endpoint = {
        let seen = seen.clone();
        handle
            .register_ui_endpoint(move |value: u32| {
                seen.set(value);
                value * 2
            })
            .expect("runtime alive")
    };

    let dispatcher = runtime.dispatcher();
    let worker = thread::spawn(move || dispatcher.call::<u32, u32>(endpoint, 21, None));

    pump_until(&runtime, || worker.is_finished());
    let reply = worker.join().expect("worker thread");
    assert_eq!(reply, Ok(42));
    assert_eq!(seen.get(), 21);
}

#[test]
fn endpoint_call_on_owner_thread_runs_inline() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let endpoint = handle
        .register_ui_endpoint(|value: String| value.len())
        .expect("runtime alive");

    let reply = runtime
        .dispatcher()
        .call::<String, usize>(endpoint, "four".to_string(), None);
    assert_eq!(reply, Ok(4));
    assert!(!runtime.needs_frame());
}

#[test]
fn cancelled_endpoint_leaves_caller_unanswered() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    let endpoint = handle
        .register_ui_endpoint(|value: u8| value)
        .expect("runtime alive");
    assert!(handle.cancel_ui_endpoint(endpoint));

    let dispatcher = runtime.dispatcher();
    let worker = thread::spawn(move || dispatcher.call::<u8, u8>(endpoint, 1, None));
    pump_until(&runtime, || worker.is_finished());
    assert_eq!(worker.join().expect("worker"), Err(DispatchError::Unanswered));

    let inline = runtime.dispatcher().call::<u8, u8>(endpoint, 1, None);
    assert_eq!(inline, Err(DispatchError::Unanswered));
}

#[test]
fn call_after_runtime_dropped_fails_fast() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let endpoint = runtime
        .handle()
        .register_ui_endpoint(|value: u8| value)
        .expect("runtime alive");
    let dispatcher = runtime.dispatcher();
    drop(runtime);

    let result = thread::spawn(move || dispatcher.call::<u8, u8>(endpoint, 1, None))
        .join()
        .expect("worker");
    assert_eq!(result, Err(DispatchError::RuntimeDropped));
}

#[test]
fn call_times_out_when_owner_never_drains() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let endpoint = runtime
        .handle()
        .register_ui_endpoint(|value: u8| value)
        .expect("runtime alive");
    let dispatcher = runtime.dispatcher();

    let result = thread::spawn(move || {
        dispatcher.call::<u8, u8>(endpoint, 1, Some(Duration::from_millis(20)))
    })
    .join()
    .expect("worker");
    assert_eq!(result, Err(DispatchError::Timeout));
}

#[test]
fn reply_type_mismatch_is_reported() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let endpoint = runtime
        .handle()
        .register_ui_endpoint(|value: u8| value)
        .expect("runtime alive");

    let result = runtime.dispatcher().call::<u8, String>(endpoint, 1, None);
    assert!(matches!(result, Err(DispatchError::ReplyMismatch { .. })));
}

#[test]
fn enqueue_after_runtime_dropped_runs_immediately() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let handle = runtime.handle();
    drop(runtime);
    assert!(!handle.is_alive());

    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    handle.enqueue_ui_task(Box::new(move || flag.set(true)));
    assert!(ran.get());
}
