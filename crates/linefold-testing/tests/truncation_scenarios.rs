use linefold_testing::{blocks, run_truncation_test, ReportMode, ScriptedRenderer, TruncationTestRule};
use linefold_ui::{
    BridgeConfig, Document, ExpandableConfig, LineLimit, VisibilityPlan, VisibleBlock,
};
use std::thread;
use std::time::Duration;

fn plan(entries: &[(usize, Option<usize>)]) -> VisibilityPlan {
    entries
        .iter()
        .map(|&(index, line_cap)| VisibleBlock { index, line_cap })
        .collect()
}

fn limited(lines: usize) -> ExpandableConfig {
    ExpandableConfig::default().with_line_limit(LineLimit::Lines(lines))
}

#[test]
fn partial_measurements_keep_the_capped_plan_stable() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new().with_report_mode(ReportMode::Silent);
        let controller = rule.controller(&renderer, blocks(&[2, 4, 1]), limited(5));
        let reporter = controller.reporter();

        reporter.report(0, 2);
        rule.pump_until_idle();
        assert_eq!(controller.plan(), plan(&[(0, None), (1, Some(3))]));

        reporter.report(1, 4);
        rule.pump_until_idle();
        assert_eq!(controller.plan(), plan(&[(0, None), (1, Some(3))]));
    });
}

#[test]
fn no_line_budget_shows_every_block() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new();
        let controller = rule.controller(
            &renderer,
            blocks(&[3, 3]),
            ExpandableConfig::default().with_line_limit(LineLimit::Unlimited),
        );
        assert_eq!(controller.plan(), plan(&[(0, None), (1, None)]));
    });
}

#[test]
fn zero_budget_collapsed_shows_nothing() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new();
        let controller = rule.controller(&renderer, blocks(&[3, 3]), limited(0));
        controller.layout(200.0);
        rule.pump_until_idle();

        assert!(controller.plan().is_empty());
        assert_eq!(controller.toggle_label(), Some("...See more"));
    });
}

#[test]
fn smaller_report_does_not_shrink_measurement() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new().with_report_mode(ReportMode::Silent);
        let controller = rule.controller(&renderer, blocks(&[3]), limited(5));
        let reporter = controller.reporter();

        reporter.report(0, 3);
        rule.pump_until_idle();
        reporter.report(0, 2);
        rule.pump_until_idle();

        assert_eq!(controller.measurements().get(0), Some(3));
    });
}

#[test]
fn report_order_does_not_change_the_outcome() {
    let rule = TruncationTestRule::new();
    let content = [4, 1, 6, 2, 2];

    let forward = ScriptedRenderer::new().with_report_mode(ReportMode::Deferred);
    let forward_controller = rule.controller(&forward, blocks(&content), limited(7));
    let backward = ScriptedRenderer::new().with_report_mode(ReportMode::Deferred);
    let backward_controller = rule.controller(&backward, blocks(&content), limited(7));

    forward_controller.layout(300.0);
    backward_controller.layout(300.0);
    forward.flush_reports();
    backward.flush_reports_reversed();
    rule.pump_until_idle();

    assert!(forward_controller.is_ready());
    assert_eq!(
        forward_controller.measurements(),
        backward_controller.measurements()
    );
    assert_eq!(forward_controller.plan(), backward_controller.plan());
    assert_eq!(
        forward_controller.plan(),
        plan(&[(0, None), (1, None), (2, Some(2))])
    );
}

#[test]
fn reports_from_a_worker_thread_reach_the_controller() {
    let rule = TruncationTestRule::new();
    let renderer = ScriptedRenderer::new().with_report_mode(ReportMode::Deferred);
    let controller = rule.controller(&renderer, blocks(&[1, 2, 3]), limited(4));
    controller.layout(200.0);

    let worker = renderer.flush_reports_on_thread();
    let ready = rule.pump_until(Duration::from_secs(5), || controller.is_ready());
    worker.join().expect("reporting thread panicked");

    assert!(ready);
    assert_eq!(controller.plan(), plan(&[(0, None), (1, None), (2, Some(1))]));
}

#[test]
fn expansion_is_idempotent_over_two_toggles() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new();
        let controller = rule.controller(&renderer, blocks(&[2, 5, 1]), limited(3));
        controller.layout(200.0);
        rule.pump_until_idle();
        let collapsed = controller.plan();
        let collapsed_height = controller.layout(200.0);

        controller.toggle();
        rule.pump_until_idle();
        assert_eq!(controller.plan(), VisibilityPlan::all(3));

        controller.toggle();
        rule.pump_until_idle();
        assert_eq!(controller.plan(), collapsed);
        assert_eq!(controller.layout(200.0), collapsed_height);
    });
}

#[test]
fn new_content_resets_state() {
    run_truncation_test(|rule| {
        let renderer = ScriptedRenderer::new();
        let controller = rule.controller(&renderer, blocks(&[2, 5]), limited(3));
        controller.layout(200.0);
        rule.pump_until_idle();
        controller.toggle();

        controller.set_document(Document::new(blocks(&[1])));
        assert!(!controller.is_expanded());
        assert!(!controller.is_ready());
        assert!(controller.measurements().is_empty());
    });
}

#[test]
fn feed_cells_measure_from_a_layout_thread() {
    let rule = TruncationTestRule::new();
    let renderer = ScriptedRenderer::new();
    let posts = [vec![1, 1], vec![4, 4, 4], vec![2]];
    let bridges: Vec<_> = posts
        .iter()
        .map(|post| {
            rule.bridge(
                &renderer,
                blocks(post),
                limited(3),
                BridgeConfig::default(),
            )
        })
        .collect();
    let handles: Vec<_> = bridges.iter().map(|bridge| bridge.handle()).collect();

    let worker = thread::spawn(move || {
        handles
            .iter()
            .map(|handle| handle.measure(320.0))
            .collect::<Vec<f32>>()
    });
    let finished = rule.pump_until(Duration::from_secs(5), || worker.is_finished());
    assert!(finished);
    let heights = worker.join().expect("layout thread panicked");

    let line = renderer.line_height();
    let toggle = renderer.toggle_height();
    assert_eq!(
        heights,
        vec![
            (line + 8.0 + toggle).ceil(),
            (3.0 * line + 8.0 + toggle).ceil(),
            (2.0 * line + 8.0 + toggle).ceil(),
        ]
    );

    rule.pump_until_idle();
    assert!(bridges.iter().all(|bridge| bridge.controller().is_ready()));
    assert_eq!(
        bridges[0].size_report(),
        Some((2.0 * line + 2.0 * 8.0 + toggle).ceil())
    );
}
