//! Thread-safe measurement reporting.
//!
//! Renderers report natural line counts through a [`MeasurementReporter`]
//! from whatever thread finishes layout. Reports are buffered and the owner
//! thread is woken once per batch; the owner then takes the whole batch and
//! merges it in one go.

use crate::measurement::MeasurementSnapshot;
use linefold_core::{EndpointId, UiDispatcher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Message delivered to the owner-thread endpoint when a batch is waiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportWake {
    /// Document generation the batch belongs to.
    pub generation: u64,
}

#[derive(Default)]
struct PendingBatch {
    entries: MeasurementSnapshot,
    wake_sent: bool,
}

#[derive(Clone)]
struct WakeTarget {
    dispatcher: UiDispatcher,
    endpoint: EndpointId,
}

/// Collects natural line counts for one document generation.
#[derive(Clone)]
pub struct MeasurementReporter {
    pending: Arc<Mutex<PendingBatch>>,
    target: Option<WakeTarget>,
    generation: u64,
}

impl MeasurementReporter {
    /// Reporter that wakes `endpoint` on the owner thread whenever a new
    /// batch starts.
    pub fn new(dispatcher: UiDispatcher, endpoint: EndpointId, generation: u64) -> Self {
        Self {
            pending: Arc::default(),
            target: Some(WakeTarget {
                dispatcher,
                endpoint,
            }),
            generation,
        }
    }

    /// Reporter that only buffers. The owner polls it with
    /// [`take_batch`](Self::take_batch).
    pub fn buffered(generation: u64) -> Self {
        Self {
            pending: Arc::default(),
            target: None,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records that `block_index` needs `lines` lines when rendered without
    /// a cap. Zero means the block has not been laid out yet and is dropped.
    pub fn report(&self, block_index: usize, lines: usize) {
        if lines == 0 {
            log::trace!("skipping unmeasured report for block {block_index}");
            return;
        }
        let needs_wake = {
            let mut pending = self.lock();
            pending.entries.raise(block_index, lines);
            !std::mem::replace(&mut pending.wake_sent, true)
        };
        if !needs_wake {
            return;
        }
        if let Some(target) = &self.target {
            let wake = ReportWake {
                generation: self.generation,
            };
            if !target.dispatcher.send(target.endpoint, wake) {
                log::debug!(
                    "runtime gone; measurement batch for generation {} not delivered",
                    self.generation
                );
            }
        }
    }

    /// Takes every report buffered since the previous call.
    pub fn take_batch(&self) -> MeasurementSnapshot {
        let mut pending = self.lock();
        pending.wake_sent = false;
        std::mem::take(&mut pending.entries)
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, PendingBatch> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MeasurementReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementReporter")
            .field("generation", &self.generation)
            .field("endpoint", &self.target.as_ref().map(|target| target.endpoint))
            .finish()
    }
}
