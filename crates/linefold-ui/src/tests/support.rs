use crate::{BlockRenderer, MeasurementReporter, RenderDirective, RenderPass};
use linefold_core::{DefaultScheduler, Runtime};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

pub const LINE_HEIGHT: f32 = 10.0;
pub const TOGGLE_HEIGHT: f32 = 20.0;

/// Renders a block given as its natural line count and reports that count
/// right away.
#[derive(Clone)]
pub struct LineRenderer {
    pub line_height: f32,
    pub directives: Rc<RefCell<Vec<RenderDirective>>>,
    pub toggle_labels: Rc<RefCell<Vec<String>>>,
    pub silent: Rc<Cell<bool>>,
}

impl LineRenderer {
    pub fn new() -> Self {
        Self::with_line_height(LINE_HEIGHT)
    }

    pub fn with_line_height(line_height: f32) -> Self {
        Self {
            line_height,
            directives: Rc::default(),
            toggle_labels: Rc::default(),
            silent: Rc::default(),
        }
    }

    pub fn shadow_renders(&self) -> usize {
        self.directives
            .borrow()
            .iter()
            .filter(|directive| directive.pass == RenderPass::Shadow)
            .count()
    }

    pub fn clear(&self) {
        self.directives.borrow_mut().clear();
        self.toggle_labels.borrow_mut().clear();
    }
}

impl BlockRenderer for LineRenderer {
    type Block = usize;

    fn render_block(
        &mut self,
        block: &usize,
        directive: &RenderDirective,
        reporter: &MeasurementReporter,
    ) -> f32 {
        self.directives.borrow_mut().push(*directive);
        if !self.silent.get() {
            reporter.report(directive.block_index, *block);
        }
        let shown = directive.line_cap.map_or(*block, |cap| cap.min(*block));
        shown as f32 * self.line_height
    }

    fn render_toggle(&mut self, label: &str, _width: f32) -> f32 {
        self.toggle_labels.borrow_mut().push(label.to_owned());
        TOGGLE_HEIGHT
    }
}

pub fn runtime() -> Runtime {
    Runtime::new(Arc::new(DefaultScheduler))
}
