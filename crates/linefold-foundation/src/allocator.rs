//! Line budget allocation.
//!
//! Decides which blocks a collapsed document shows and how many lines of
//! each, from the block count, the line budget and whatever measurements
//! are known so far.

use crate::measurement::MeasurementSnapshot;
use smallvec::SmallVec;

/// One block of a [`VisibilityPlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisibleBlock {
    pub index: usize,
    /// `None` renders the block in full; `Some(n)` renders at most `n >= 1`
    /// lines.
    pub line_cap: Option<usize>,
}

impl VisibleBlock {
    pub fn full(index: usize) -> Self {
        Self {
            index,
            line_cap: None,
        }
    }

    pub fn capped(index: usize, lines: usize) -> Self {
        Self {
            index,
            line_cap: Some(lines),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.line_cap.is_some()
    }
}

/// Blocks to render, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityPlan {
    blocks: SmallVec<[VisibleBlock; 8]>,
}

impl VisibilityPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan showing every block in full.
    pub fn all(total_blocks: usize) -> Self {
        (0..total_blocks).map(VisibleBlock::full).collect()
    }

    pub fn blocks(&self) -> &[VisibleBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisibleBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns `Some(line_cap)` when `block_index` is part of the plan.
    pub fn line_cap(&self, block_index: usize) -> Option<Option<usize>> {
        self.blocks
            .iter()
            .find(|block| block.index == block_index)
            .map(|block| block.line_cap)
    }

    /// Upper bound on rendered lines; `None` if any block renders in full
    /// without a known size.
    pub fn line_bound(&self, snapshot: &MeasurementSnapshot) -> Option<usize> {
        self.blocks.iter().try_fold(0usize, |sum, block| {
            let lines = block.line_cap.or_else(|| snapshot.get(block.index))?;
            Some(sum + lines)
        })
    }

    fn push(&mut self, block: VisibleBlock) {
        self.blocks.push(block);
    }
}

impl FromIterator<VisibleBlock> for VisibilityPlan {
    fn from_iter<I: IntoIterator<Item = VisibleBlock>>(iter: I) -> Self {
        Self {
            blocks: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a VisibilityPlan {
    type Item = &'a VisibleBlock;
    type IntoIter = std::slice::Iter<'a, VisibleBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Computes the visibility plan for one document.
///
/// Expanded documents and documents without a budget show every block in
/// full. Otherwise blocks are walked in order against the remaining
/// budget: measured blocks that fit are shown in full, the first block that
/// does not fit is capped to what is left, and an unmeasured block takes
/// all that is left. Nothing is shown once the budget is spent.
pub fn allocate(
    total_blocks: usize,
    line_budget: Option<usize>,
    expanded: bool,
    snapshot: &MeasurementSnapshot,
) -> VisibilityPlan {
    let remaining = match line_budget {
        Some(budget) if !expanded => budget,
        _ => return VisibilityPlan::all(total_blocks),
    };

    let mut remaining = remaining;
    let mut plan = VisibilityPlan::new();
    for index in 0..total_blocks {
        match snapshot.get(index) {
            Some(measured) if measured <= remaining => {
                plan.push(VisibleBlock::full(index));
                remaining -= measured;
            }
            _ if remaining > 0 => {
                plan.push(VisibleBlock::capped(index, remaining));
                remaining = 0;
            }
            _ => {}
        }
        if remaining == 0 {
            break;
        }
    }
    plan
}
