//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides a concrete [`RuntimeScheduler`] for hosts that drive
//! the owner thread with a plain loop: the loop blocks in
//! [`StdRuntime::wait_for_frame`] and drains whenever work arrives.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};

use linefold_core::{Runtime, RuntimeHandle, RuntimeScheduler, UiDispatcher};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Scheduler that records frame requests and wakes a waiting owner thread.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    frame_waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
    signal: Mutex<bool>,
    condvar: Condvar,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            frame_waker: RwLock::new(None),
            signal: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        let requested = self.frame_requested.swap(false, Ordering::SeqCst);
        if let Ok(mut signal) = self.signal.lock() {
            *signal = false;
        }
        requested
    }

    /// Blocks until a frame is requested or `timeout` elapses. Returns
    /// whether a request was observed; the request is consumed.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let Ok(signal) = self.signal.lock() else {
            return self.take_frame_request();
        };
        let waited = self
            .condvar
            .wait_timeout_while(signal, timeout, |signaled| !*signaled);
        if let Ok((mut signal, _)) = waited {
            *signal = false;
        }
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a new frame is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut slot) = self.frame_waker.write() {
            *slot = Some(Arc::new(waker));
        }
    }

    /// Clears any registered frame waker.
    pub fn clear_frame_waker(&self) {
        if let Ok(mut slot) = self.frame_waker.write() {
            *slot = None;
        }
    }

    fn wake(&self) {
        if let Ok(mut signal) = self.signal.lock() {
            *signal = true;
        }
        self.condvar.notify_all();
        let waker = self
            .frame_waker
            .read()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Convenience container bundling the standard scheduler and a runtime
/// owned by the current thread.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    /// Creates a runtime whose owner thread is the calling thread.
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self { scheduler, runtime }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn dispatcher(&self) -> UiDispatcher {
        self.runtime.dispatcher()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Blocks the owner thread until work is scheduled or `timeout` elapses,
    /// then drains. Returns whether any work was scheduled.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let requested = self.runtime.needs_frame() || self.scheduler.wait_for_frame(timeout);
        self.runtime.drain_ui();
        requested
    }

    /// Pumps the runtime until `done` returns true or `timeout` elapses.
    /// Between drains the thread sleeps until work is scheduled, waking
    /// periodically to re-check `done`. Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.runtime.drain_ui();
            if done() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_frame((deadline - now).min(IDLE_POLL_INTERVAL));
        }
    }

    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("runtime", &self.runtime)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
