use super::{StdRuntime, StdScheduler};
use linefold_core::RuntimeScheduler;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn enqueued_task_requests_frame() {
    let runtime = StdRuntime::new();
    let ran = Rc::new(Cell::new(false));
    {
        let ran = ran.clone();
        runtime
            .runtime_handle()
            .enqueue_ui_task(Box::new(move || ran.set(true)));
    }

    assert!(runtime.take_frame_request(), "enqueue should request a frame");
    assert!(!runtime.take_frame_request(), "request is consumed");
    runtime.runtime().drain_ui();
    assert!(ran.get());
}

#[test]
fn frame_waker_runs_on_schedule() {
    let scheduler = StdScheduler::new();
    let wakes = Arc::new(AtomicUsize::new(0));
    {
        let wakes = wakes.clone();
        scheduler.set_frame_waker(move || {
            wakes.fetch_add(1, Ordering::SeqCst);
        });
    }
    scheduler.schedule_frame();
    scheduler.schedule_frame();
    assert_eq!(wakes.load(Ordering::SeqCst), 2);

    scheduler.clear_frame_waker();
    scheduler.schedule_frame();
    assert_eq!(wakes.load(Ordering::SeqCst), 2);
}

#[test]
fn wait_for_frame_times_out_without_work() {
    let scheduler = StdScheduler::new();
    assert!(!scheduler.wait_for_frame(Duration::from_millis(5)));
}

#[test]
fn wait_for_frame_wakes_on_worker_post() {
    let runtime = StdRuntime::new();
    let dispatcher = runtime.dispatcher();
    let hits = Arc::new(AtomicUsize::new(0));

    let worker = {
        let hits = hits.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            dispatcher.post(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        })
    };

    let finished = runtime.run_until(Duration::from_secs(5), || hits.load(Ordering::SeqCst) == 1);
    worker.join().expect("worker thread panicked");
    assert!(finished);
}

#[test]
fn worker_call_is_answered_by_run_until() {
    let runtime = StdRuntime::new();
    let handle = runtime.runtime_handle();
    let endpoint = handle
        .register_ui_endpoint(|width: f32| width * 2.0)
        .expect("runtime alive");
    let dispatcher = runtime.dispatcher();

    let worker = thread::spawn(move || dispatcher.call::<f32, f32>(endpoint, 21.0, None));

    for _ in 0..5_000 {
        runtime.wait_for_frame(Duration::from_millis(1));
        if worker.is_finished() {
            break;
        }
    }
    assert_eq!(worker.join().expect("worker thread panicked"), Ok(42.0));
}
