use crate::test_support::{runtime, LineRenderer, LINE_HEIGHT, TOGGLE_HEIGHT};
use crate::{BlockParser, DocumentHostBuilder, LineLimit, RenderPass, VisibilityPlan};
use std::cell::RefCell;
use std::rc::Rc;

const SPACING: f32 = 8.0;

/// Paragraphs separated by blank lines; each block is its line count.
struct ParagraphParser;

impl BlockParser for ParagraphParser {
    type Block = usize;

    fn parse(&self, text: &str) -> Vec<usize> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(|paragraph| paragraph.lines().count())
            .collect()
    }
}

const POST: &str = "one\ntwo\nthree\n\nfour\nfive\nsix\nseven\n\neight\nnine";

#[test]
fn without_line_limit_shows_whole_document_and_no_toggle() {
    let runtime = runtime();
    let renderer = LineRenderer::new();
    let host = DocumentHostBuilder::new(ParagraphParser).build(
        runtime.handle(),
        renderer.clone(),
        POST,
    );

    assert!(!host.has_toggle());
    assert_eq!(host.controller().plan(), VisibilityPlan::all(3));
    assert_eq!(
        host.current_height(),
        Some(9.0 * LINE_HEIGHT + 2.0 * SPACING)
    );
    assert!(renderer.toggle_labels.borrow().is_empty());
}

#[test]
fn line_limit_wraps_content_in_an_expandable_controller() {
    let runtime = runtime();
    let heights: Rc<RefCell<Vec<f32>>> = Rc::default();
    let host = {
        let heights = heights.clone();
        DocumentHostBuilder::new(ParagraphParser)
            .line_limit(Some(5))
            .on_height_change(move |height| heights.borrow_mut().push(height))
            .build(runtime.handle(), LineRenderer::new(), POST)
    };

    assert!(host.has_toggle());
    assert_eq!(host.controller().config().line_limit, LineLimit::Lines(5));

    runtime.drain_ui();
    let collapsed = 3.0 * LINE_HEIGHT + SPACING + 2.0 * LINE_HEIGHT + SPACING + TOGGLE_HEIGHT;
    assert_eq!(heights.borrow().last().copied(), Some(collapsed));

    host.toggle();
    runtime.drain_ui();
    let expanded = 9.0 * LINE_HEIGHT + 3.0 * SPACING + TOGGLE_HEIGHT;
    assert_eq!(heights.borrow().last().copied(), Some(expanded));
    assert_eq!(host.current_height(), Some(expanded));
}

#[test]
fn initial_layout_uses_the_fallback_width() {
    let runtime = runtime();
    let renderer = LineRenderer::new();
    let _host = DocumentHostBuilder::new(ParagraphParser)
        .line_limit(Some(2))
        .build(runtime.handle(), renderer.clone(), POST);

    let widths: Vec<f32> = renderer
        .directives
        .borrow()
        .iter()
        .filter(|directive| directive.pass == RenderPass::Visible)
        .map(|directive| directive.width)
        .collect();
    assert_eq!(widths, vec![390.0]);
}

#[test]
fn zero_line_limit_is_clamped_to_one() {
    let runtime = runtime();
    let host = DocumentHostBuilder::new(ParagraphParser)
        .line_limit(Some(0))
        .build(runtime.handle(), LineRenderer::new(), POST);

    assert_eq!(host.controller().config().line_limit, LineLimit::Lines(1));
}

#[test]
fn preprocessor_runs_before_parsing() {
    let runtime = runtime();
    let host = DocumentHostBuilder::new(ParagraphParser)
        .preprocessor(|text: &str| text.replace("\n\n", "\n"))
        .build(runtime.handle(), LineRenderer::new(), POST);

    assert_eq!(host.controller().total_blocks(), 1);
}

#[test]
fn new_text_collapses_and_remeasures() {
    let runtime = runtime();
    let host = DocumentHostBuilder::new(ParagraphParser)
        .line_limit(Some(3))
        .build(runtime.handle(), LineRenderer::new(), POST);
    runtime.drain_ui();
    host.toggle();
    assert!(host.is_expanded());

    host.set_text("a\n\nb");
    assert!(!host.is_expanded());
    assert_eq!(host.controller().total_blocks(), 2);
    assert!(!host.controller().is_ready());

    runtime.drain_ui();
    assert!(host.controller().is_ready());
    assert_eq!(
        host.current_height(),
        Some(LINE_HEIGHT + SPACING + LINE_HEIGHT + SPACING + TOGGLE_HEIGHT)
    );
}
