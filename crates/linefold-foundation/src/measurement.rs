//! Monotonic per-block measurement storage.
//!
//! Natural line counts arrive block by block, in any order and possibly more
//! than once. The store keeps the largest value seen for each block so the
//! result does not depend on arrival order.

use linefold_core::collections::map::HashMap;

/// Natural line counts keyed by block index.
///
/// Absent entries have not been measured yet. Every stored value is at
/// least 1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeasurementSnapshot {
    lines: HashMap<usize, usize>,
}

impl MeasurementSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block_index: usize) -> Option<usize> {
        self.lines.get(&block_index).copied()
    }

    pub fn contains(&self, block_index: usize) -> bool {
        self.lines.contains_key(&block_index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lines.iter().map(|(index, lines)| (*index, *lines))
    }

    /// Keeps the larger of `lines` and the stored value. Returns true when
    /// the stored value changed.
    pub(crate) fn raise(&mut self, block_index: usize, lines: usize) -> bool {
        match self.lines.get_mut(&block_index) {
            Some(current) if *current >= lines => false,
            Some(current) => {
                *current = lines;
                true
            }
            None => {
                self.lines.insert(block_index, lines);
                true
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }
}

impl FromIterator<(usize, usize)> for MeasurementSnapshot {
    /// Collects entries with max-merge semantics. Zero counts are skipped.
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (index, lines) in iter {
            if lines > 0 {
                snapshot.raise(index, lines);
            }
        }
        snapshot
    }
}

impl<const N: usize> From<[(usize, usize); N]> for MeasurementSnapshot {
    fn from(entries: [(usize, usize); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// What a [`MeasurementStore::merge`] call changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// At least one stored value was raised.
    pub changed: bool,
    /// This merge completed the store.
    pub became_ready: bool,
}

/// Best-known natural line count per block of one document.
#[derive(Debug)]
pub struct MeasurementStore {
    total_blocks: usize,
    snapshot: MeasurementSnapshot,
    ready: bool,
}

impl MeasurementStore {
    pub fn new(total_blocks: usize) -> Self {
        Self {
            total_blocks,
            snapshot: MeasurementSnapshot::new(),
            ready: total_blocks == 0,
        }
    }

    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    /// True once every block has been measured. Never reverts for the same
    /// document.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Copy of the current measurements.
    pub fn snapshot(&self) -> MeasurementSnapshot {
        self.snapshot.clone()
    }

    pub fn measurements(&self) -> &MeasurementSnapshot {
        &self.snapshot
    }

    pub fn get(&self, block_index: usize) -> Option<usize> {
        self.snapshot.get(block_index)
    }

    /// Max-merges `partial` into the store.
    ///
    /// Zero counts mean "not measured yet" and are skipped. Indices outside
    /// the document and values below the stored count are logged and
    /// ignored.
    pub fn merge(&mut self, partial: impl IntoIterator<Item = (usize, usize)>) -> MergeOutcome {
        let mut changed = false;
        for (block_index, lines) in partial {
            if lines == 0 {
                continue;
            }
            if block_index >= self.total_blocks {
                log::warn!(
                    "ignoring measurement for block {block_index}; document has {} blocks",
                    self.total_blocks
                );
                continue;
            }
            if let Some(current) = self.snapshot.get(block_index) {
                if lines < current {
                    log::warn!(
                        "ignoring shrinking measurement for block {block_index}: {lines} < {current}"
                    );
                    continue;
                }
            }
            changed |= self.snapshot.raise(block_index, lines);
        }

        if !changed {
            return MergeOutcome::default();
        }

        let became_ready = !self.ready && self.snapshot.len() >= self.total_blocks;
        if became_ready {
            self.ready = true;
            log::debug!("measurements ready for {} blocks", self.total_blocks);
        }
        log::trace!("merged measurements: {:?}", self.snapshot);
        MergeOutcome {
            changed,
            became_ready,
        }
    }

    /// Forgets every measurement and starts over for a new document.
    pub fn reset(&mut self, total_blocks: usize) {
        self.total_blocks = total_blocks;
        self.snapshot.clear();
        self.ready = total_blocks == 0;
    }
}
