//! Platform abstraction for the linefold runtime.
//!
//! The host decides how the owner thread is woken up; the runtime only asks
//! for it through [`RuntimeScheduler`].

/// Wakes the owner thread so it drains pending runtime work.
///
/// Implementations must be safe to call from any thread: measurement
/// reports and bridge requests arrive from worker threads.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run the runtime's drain loop soon.
    fn schedule_frame(&self);
}

/// Scheduler that never wakes anything. Hosts using it drain manually.
#[derive(Default, Debug, Clone, Copy)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}
