//! Interface to the rendering collaborator.

use linefold_foundation::MeasurementReporter;

/// Which of the two render invocations a directive belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Laid out and shown to the user.
    Visible,
    /// Invisible and non-interactive; rendered only to obtain measurements.
    /// Its height never contributes to layout.
    Shadow,
}

/// Everything a renderer needs to know about one block render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderDirective {
    pub block_index: usize,
    /// `None` renders the whole block.
    pub line_cap: Option<usize>,
    pub width: f32,
    pub pass: RenderPass,
}

impl RenderDirective {
    pub fn is_shadow(&self) -> bool {
        self.pass == RenderPass::Shadow
    }
}

/// Lays out blocks and the toggle control.
///
/// Implementations report a block's natural line count, its line count
/// without any cap at `directive.width`, through `reporter` using
/// `directive.block_index`. Reports may be made immediately or later from
/// any thread. A capped render still reports the natural count.
pub trait BlockRenderer {
    type Block;

    /// Renders `block` and returns the height it occupies.
    fn render_block(
        &mut self,
        block: &Self::Block,
        directive: &RenderDirective,
        reporter: &MeasurementReporter,
    ) -> f32;

    /// Returns the height of the toggle control showing `label`.
    fn render_toggle(&mut self, label: &str, width: f32) -> f32;
}
