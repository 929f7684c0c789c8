use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Immutable, ordered block sequence.
///
/// Every document gets a process-unique generation. Content changes build a
/// new document instead of editing blocks in place, so a generation
/// identifies one block sequence for as long as it lives.
#[derive(Debug)]
pub struct Document<B> {
    blocks: Vec<B>,
    generation: u64,
}

impl<B> Document<B> {
    pub fn new(blocks: Vec<B>) -> Self {
        Self {
            blocks,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&B> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, B> {
        self.blocks.iter()
    }
}

impl<B> FromIterator<B> for Document<B> {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<B> Default for Document<B> {
    fn default() -> Self {
        Self::empty()
    }
}
