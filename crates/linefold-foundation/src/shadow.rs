//! Shadow measurement pass.
//!
//! Renders blocks with an effectively unlimited line cap so the renderer can
//! report each block's natural line count. The output of this pass is never
//! shown and never contributes to layout.

use crate::measurement::MeasurementSnapshot;
use web_time::{Duration, Instant};

/// Line cap used for shadow renders. Large enough that no real block hits it.
pub const DEFAULT_SHADOW_LINE_CAP: usize = 1000;

/// Default time budget for a single shadow pass (50ms).
const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(50);

/// Maximum blocks rendered per pass as a hard safety limit.
const MAX_SHADOW_BLOCKS_SAFETY: usize = 10000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowPassConfig {
    pub line_cap: usize,
    pub time_budget: Duration,
    pub max_blocks: usize,
}

impl Default for ShadowPassConfig {
    fn default() -> Self {
        Self {
            line_cap: DEFAULT_SHADOW_LINE_CAP,
            time_budget: DEFAULT_TIME_BUDGET,
            max_blocks: MAX_SHADOW_BLOCKS_SAFETY,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowPassOutcome {
    pub rendered: usize,
    /// The pass stopped before reaching every block.
    pub exhausted: bool,
}

/// The pass runs until every block is measured, and keeps running while
/// the document is expanded so grown content is picked up.
pub fn shadow_pass_active(ready: bool, expanded: bool) -> bool {
    !ready || expanded
}

/// Runs the shadow render for one document.
///
/// `render_fn` receives the block index and the line cap to render with.
/// Blocks are visited unmeasured-first so that a pass cut short by its
/// budget still makes progress on the next run.
pub struct ShadowPass<'a, F> {
    render_fn: &'a mut F,
    config: &'a ShadowPassConfig,
}

impl<'a, F> ShadowPass<'a, F>
where
    F: FnMut(usize, usize),
{
    pub fn new(render_fn: &'a mut F, config: &'a ShadowPassConfig) -> Self {
        Self { render_fn, config }
    }

    pub fn run(&mut self, total_blocks: usize, snapshot: &MeasurementSnapshot) -> ShadowPassOutcome {
        let start_time = Instant::now();
        let mut outcome = ShadowPassOutcome::default();

        for index in visit_order(total_blocks, snapshot) {
            if outcome.rendered >= self.config.max_blocks {
                log::warn!(
                    "shadow pass hit the block limit ({}) with {} blocks in the document",
                    self.config.max_blocks,
                    total_blocks
                );
                outcome.exhausted = true;
                break;
            }
            if start_time.elapsed() > self.config.time_budget {
                log::warn!(
                    "shadow pass exceeded time budget ({:?}) after {} blocks. stopping early.",
                    self.config.time_budget,
                    outcome.rendered
                );
                outcome.exhausted = true;
                break;
            }
            (self.render_fn)(index, self.config.line_cap);
            outcome.rendered += 1;
        }

        outcome
    }
}

fn visit_order(
    total_blocks: usize,
    snapshot: &MeasurementSnapshot,
) -> impl Iterator<Item = usize> + '_ {
    let unmeasured = (0..total_blocks).filter(move |index| !snapshot.contains(*index));
    let measured = (0..total_blocks).filter(move |index| snapshot.contains(*index));
    unmeasured.chain(measured)
}
