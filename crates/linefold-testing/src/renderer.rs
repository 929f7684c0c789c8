//! Scripted rendering collaborator.

use linefold_foundation::MeasurementReporter;
use linefold_ui::{BlockRenderer, RenderDirective, RenderPass};
use std::cell::RefCell;
use std::rc::Rc;
use std::thread::{self, JoinHandle};

/// Block with a fixed natural line count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedBlock {
    pub label: String,
    pub natural_lines: usize,
}

impl ScriptedBlock {
    pub fn new(natural_lines: usize) -> Self {
        Self {
            label: format!("block with {natural_lines} lines"),
            natural_lines,
        }
    }

    pub fn labeled(label: impl Into<String>, natural_lines: usize) -> Self {
        Self {
            label: label.into(),
            natural_lines,
        }
    }
}

/// Blocks with the given natural line counts.
pub fn blocks(lines: &[usize]) -> Vec<ScriptedBlock> {
    lines.iter().copied().map(ScriptedBlock::new).collect()
}

/// When the renderer reports natural line counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// During the render call.
    #[default]
    Immediate,
    /// Held back until the test flushes them, to model a renderer whose
    /// layout finishes later.
    Deferred,
    /// Never.
    Silent,
}

#[derive(Clone)]
struct DeferredReport {
    reporter: MeasurementReporter,
    block_index: usize,
    lines: usize,
}

struct ScriptState {
    line_height: f32,
    toggle_height: f32,
    mode: ReportMode,
    renders: Vec<RenderDirective>,
    toggle_labels: Vec<String>,
    deferred: Vec<DeferredReport>,
}

/// Fake [`BlockRenderer`] that renders `natural_lines` rows of fixed height
/// and records every directive it receives.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// controller owns another.
#[derive(Clone)]
pub struct ScriptedRenderer {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedRenderer {
    pub const DEFAULT_LINE_HEIGHT: f32 = 20.0;
    pub const DEFAULT_TOGGLE_HEIGHT: f32 = 24.0;

    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ScriptState {
                line_height: Self::DEFAULT_LINE_HEIGHT,
                toggle_height: Self::DEFAULT_TOGGLE_HEIGHT,
                mode: ReportMode::Immediate,
                renders: Vec::new(),
                toggle_labels: Vec::new(),
                deferred: Vec::new(),
            })),
        }
    }

    pub fn with_line_height(self, line_height: f32) -> Self {
        self.state.borrow_mut().line_height = line_height;
        self
    }

    pub fn with_toggle_height(self, toggle_height: f32) -> Self {
        self.state.borrow_mut().toggle_height = toggle_height;
        self
    }

    pub fn with_report_mode(self, mode: ReportMode) -> Self {
        self.set_report_mode(mode);
        self
    }

    pub fn set_report_mode(&self, mode: ReportMode) {
        self.state.borrow_mut().mode = mode;
    }

    pub fn line_height(&self) -> f32 {
        self.state.borrow().line_height
    }

    pub fn toggle_height(&self) -> f32 {
        self.state.borrow().toggle_height
    }

    /// Every directive received so far, in order.
    pub fn renders(&self) -> Vec<RenderDirective> {
        self.state.borrow().renders.clone()
    }

    pub fn visible_renders(&self) -> Vec<RenderDirective> {
        self.renders_in(RenderPass::Visible)
    }

    pub fn shadow_renders(&self) -> Vec<RenderDirective> {
        self.renders_in(RenderPass::Shadow)
    }

    pub fn toggle_labels(&self) -> Vec<String> {
        self.state.borrow().toggle_labels.clone()
    }

    pub fn clear_history(&self) {
        let mut state = self.state.borrow_mut();
        state.renders.clear();
        state.toggle_labels.clear();
    }

    pub fn deferred_count(&self) -> usize {
        self.state.borrow().deferred.len()
    }

    /// Delivers held-back reports in render order.
    pub fn flush_reports(&self) {
        for report in self.take_deferred() {
            report.reporter.report(report.block_index, report.lines);
        }
    }

    /// Delivers held-back reports in reverse render order.
    pub fn flush_reports_reversed(&self) {
        for report in self.take_deferred().into_iter().rev() {
            report.reporter.report(report.block_index, report.lines);
        }
    }

    /// Delivers held-back reports from a new thread.
    pub fn flush_reports_on_thread(&self) -> JoinHandle<()> {
        let reports: Vec<(MeasurementReporter, usize, usize)> = self
            .take_deferred()
            .into_iter()
            .map(|report| (report.reporter, report.block_index, report.lines))
            .collect();
        thread::spawn(move || {
            for (reporter, block_index, lines) in reports {
                reporter.report(block_index, lines);
            }
        })
    }

    fn take_deferred(&self) -> Vec<DeferredReport> {
        std::mem::take(&mut self.state.borrow_mut().deferred)
    }

    fn renders_in(&self, pass: RenderPass) -> Vec<RenderDirective> {
        self.state
            .borrow()
            .renders
            .iter()
            .filter(|directive| directive.pass == pass)
            .copied()
            .collect()
    }
}

impl Default for ScriptedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRenderer for ScriptedRenderer {
    type Block = ScriptedBlock;

    fn render_block(
        &mut self,
        block: &ScriptedBlock,
        directive: &RenderDirective,
        reporter: &MeasurementReporter,
    ) -> f32 {
        let mut state = self.state.borrow_mut();
        state.renders.push(*directive);
        let mode = state.mode;
        match mode {
            ReportMode::Immediate => reporter.report(directive.block_index, block.natural_lines),
            ReportMode::Deferred => state.deferred.push(DeferredReport {
                reporter: reporter.clone(),
                block_index: directive.block_index,
                lines: block.natural_lines,
            }),
            ReportMode::Silent => {}
        }
        let shown = directive
            .line_cap
            .map_or(block.natural_lines, |cap| cap.min(block.natural_lines));
        shown as f32 * state.line_height
    }

    fn render_toggle(&mut self, label: &str, _width: f32) -> f32 {
        let mut state = self.state.borrow_mut();
        state.toggle_labels.push(label.to_owned());
        state.toggle_height
    }
}

impl std::fmt::Debug for ScriptedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScriptedRenderer")
            .field("mode", &state.mode)
            .field("renders", &state.renders.len())
            .field("deferred", &state.deferred.len())
            .finish()
    }
}
