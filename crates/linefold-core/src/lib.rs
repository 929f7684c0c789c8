#![doc = r"Owner-thread runtime and observer plumbing for the linefold truncation engine."]
#![allow(clippy::missing_const_for_thread_local)]

pub mod collections;
pub mod listeners;
pub mod platform;
pub mod runtime;

pub use listeners::{Listeners, Subscription};
pub use platform::{DefaultScheduler, RuntimeScheduler};
pub use runtime::{EndpointId, Runtime, RuntimeHandle, RuntimeId, UiDispatcher};

/// Failure of a cross-thread call made through [`UiDispatcher::call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The runtime was dropped before the request could be queued.
    RuntimeDropped,
    /// The request was dropped without a reply, either because its endpoint
    /// was cancelled or because the runtime went away with it still queued.
    Unanswered,
    /// No reply arrived within the caller's timeout.
    Timeout,
    /// The endpoint replied with a different type than the caller expected.
    ReplyMismatch { expected: &'static str },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::RuntimeDropped => write!(f, "runtime dropped"),
            DispatchError::Unanswered => write!(f, "request dropped without a reply"),
            DispatchError::Timeout => write!(f, "timed out waiting for the owner thread"),
            DispatchError::ReplyMismatch { expected } => {
                write!(f, "reply type mismatch; expected {expected}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod runtime_tests;

#[cfg(test)]
#[path = "tests/listeners_tests.rs"]
mod listeners_tests;
