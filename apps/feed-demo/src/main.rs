use anyhow::{bail, Context};
use linefold_runtime_std::StdRuntime;
use linefold_ui::{
    BlockParser, BlockRenderer, DocumentHost, DocumentHostBuilder, MeasurementReporter,
    RenderDirective,
};
use std::thread;
use std::time::Duration;

const CHAR_WIDTH: f32 = 8.0;
const LINE_HEIGHT: f32 = 18.0;
const CELL_WIDTH: f32 = 320.0;
const LINE_LIMIT: usize = 3;

const POSTS: &[&str] = &[
    "Short note.",
    "Shipped the new release today. The changelog is long, so here is the \
     short version.\n\nStartup is faster on cold caches and the settings \
     screen remembers where you left it.\n\nThanks to everyone who filed \
     reports during the beta.",
    "Reading list for the weekend:\n\n\n\nA history of typesetting.\n\nNotes \
     on building reliable queues with very small teams and very large \
     backlogs.",
];

/// Paragraphs separated by blank lines.
struct ParagraphParser;

impl BlockParser for ParagraphParser {
    type Block = String;

    fn parse(&self, text: &str) -> Vec<String> {
        text.split("\n\n")
            .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|paragraph| !paragraph.is_empty())
            .collect()
    }
}

/// Fixed-pitch word wrapping.
#[derive(Clone, Copy)]
struct MonospaceRenderer;

impl MonospaceRenderer {
    fn wrapped_lines(text: &str, width: f32) -> usize {
        let columns = ((width / CHAR_WIDTH).floor() as usize).max(1);
        let mut lines = 0;
        let mut used = 0;
        for word in text.split_whitespace() {
            let len = word.chars().count();
            if used == 0 {
                lines += 1;
                used = len;
            } else if used + 1 + len <= columns {
                used += 1 + len;
            } else {
                lines += 1;
                used = len;
            }
            // Words wider than the cell spill over whole lines.
            while used > columns {
                lines += 1;
                used -= columns;
            }
        }
        lines
    }
}

impl BlockRenderer for MonospaceRenderer {
    type Block = String;

    fn render_block(
        &mut self,
        block: &String,
        directive: &RenderDirective,
        reporter: &MeasurementReporter,
    ) -> f32 {
        let natural = Self::wrapped_lines(block, directive.width);
        reporter.report(directive.block_index, natural);
        let shown = directive
            .line_cap
            .map_or(natural, |cap| natural.min(cap));
        shown as f32 * LINE_HEIGHT
    }

    fn render_toggle(&mut self, _label: &str, _width: f32) -> f32 {
        LINE_HEIGHT
    }
}

fn print_feed(hosts: &[DocumentHost<MonospaceRenderer>]) {
    for (index, host) in hosts.iter().enumerate() {
        let plan = host.controller().plan();
        println!(
            "post {index}: height {:>6.1} blocks {}/{} expanded {} toggle {:?}",
            host.current_height().unwrap_or_default(),
            plan.len(),
            host.controller().total_blocks(),
            host.is_expanded(),
            host.controller().toggle_label(),
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let runtime = StdRuntime::new();
    let hosts: Vec<_> = POSTS
        .iter()
        .enumerate()
        .map(|(index, text)| {
            DocumentHostBuilder::new(ParagraphParser)
                .line_limit(Some(LINE_LIMIT))
                .on_height_change(move |height| {
                    log::info!("post {index} height changed to {height}");
                })
                .build(runtime.runtime_handle(), MonospaceRenderer, text)
        })
        .collect();

    // A list view lays cells out off the owner thread.
    let handles: Vec<_> = hosts.iter().map(DocumentHost::handle).collect();
    let layout = thread::Builder::new()
        .name("feed-layout".into())
        .spawn(move || {
            handles
                .iter()
                .map(|handle| handle.measure(CELL_WIDTH))
                .collect::<Vec<f32>>()
        })
        .context("failed to spawn layout thread")?;

    if !runtime.run_until(Duration::from_secs(5), || layout.is_finished()) {
        bail!("layout thread did not finish in time");
    }
    let measured = match layout.join() {
        Ok(heights) => heights,
        Err(_) => bail!("layout thread panicked"),
    };
    println!("measured from layout thread: {measured:?}");

    runtime.run_until(Duration::from_millis(200), || {
        hosts.iter().all(|host| host.controller().is_ready())
    });
    print_feed(&hosts);

    let post = &hosts[1];
    let before = post.current_height().unwrap_or_default();
    post.toggle();
    runtime.runtime().drain_ui();
    let after = post.current_height().unwrap_or_default();
    println!("expanding post 1: {before} -> {after}");
    print_feed(&hosts);

    Ok(())
}
