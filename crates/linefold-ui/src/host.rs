//! Imperative host view.
//!
//! [`DocumentHost`] is what a list cell or any other non-reactive surface
//! embeds: it turns raw text into a document, keeps the controller and the
//! height bridge together, and reports height changes through a plain
//! callback.

use crate::bridge::{BridgeHandle, SyncHeightBridge};
use crate::config::{BridgeConfig, ExpandableConfig};
use crate::controller::ExpandableController;
use crate::renderer::BlockRenderer;
use linefold_core::RuntimeHandle;
use linefold_foundation::{Document, LineLimit};
use std::rc::Rc;

/// Rewrites raw text before it is parsed.
pub trait TextPreprocessor {
    fn preprocess(&self, text: &str) -> String;
}

impl<F> TextPreprocessor for F
where
    F: Fn(&str) -> String,
{
    fn preprocess(&self, text: &str) -> String {
        self(text)
    }
}

/// Splits text into the blocks a renderer understands.
pub trait BlockParser {
    type Block;

    fn parse(&self, text: &str) -> Vec<Self::Block>;
}

struct TextPipeline<B> {
    parser: Box<dyn BlockParser<Block = B>>,
    preprocessor: Option<Box<dyn TextPreprocessor>>,
}

impl<B> TextPipeline<B> {
    fn document(&self, text: &str) -> Document<B> {
        let blocks = match &self.preprocessor {
            Some(preprocessor) => self.parser.parse(&preprocessor.preprocess(text)),
            None => self.parser.parse(text),
        };
        Document::new(blocks)
    }
}

/// Configures and builds a [`DocumentHost`].
pub struct DocumentHostBuilder<B> {
    pipeline: TextPipeline<B>,
    line_limit: Option<usize>,
    expandable: ExpandableConfig,
    bridge: BridgeConfig,
    on_height_change: Option<Rc<dyn Fn(f32)>>,
}

impl<B: 'static> DocumentHostBuilder<B> {
    pub fn new(parser: impl BlockParser<Block = B> + 'static) -> Self {
        Self {
            pipeline: TextPipeline {
                parser: Box::new(parser),
                preprocessor: None,
            },
            line_limit: None,
            expandable: ExpandableConfig::default(),
            bridge: BridgeConfig::default(),
            on_height_change: None,
        }
    }

    /// Collapsed line budget. `None` shows the whole document without a
    /// toggle control; `Some(0)` is treated as one line.
    pub fn line_limit(mut self, lines: Option<usize>) -> Self {
        self.line_limit = lines;
        self
    }

    pub fn preprocessor(mut self, preprocessor: impl TextPreprocessor + 'static) -> Self {
        self.pipeline.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Labels, spacing and shadow pass settings. The line limit is taken
    /// from [`line_limit`](Self::line_limit) instead.
    pub fn expandable_config(mut self, config: ExpandableConfig) -> Self {
        self.expandable = config;
        self
    }

    pub fn bridge_config(mut self, config: BridgeConfig) -> Self {
        self.bridge = config;
        self
    }

    pub fn on_height_change(mut self, callback: impl Fn(f32) + 'static) -> Self {
        self.on_height_change = Some(Rc::new(callback));
        self
    }

    /// Parses `text`, wires up the controller and bridge, and runs the
    /// initial layout at the fallback width.
    pub fn build<R>(self, runtime: RuntimeHandle, renderer: R, text: &str) -> DocumentHost<R>
    where
        R: BlockRenderer<Block = B> + 'static,
    {
        let document = self.pipeline.document(text);
        let config = self
            .expandable
            .with_line_limit(LineLimit::from_optional(self.line_limit));
        let controller = ExpandableController::new(runtime, renderer, document, config);
        let bridge = SyncHeightBridge::new(controller, self.bridge);
        if let Some(callback) = self.on_height_change {
            bridge.set_on_height_change_rc(callback);
        }
        let host = DocumentHost {
            pipeline: self.pipeline,
            bridge,
        };
        host.layout_bounds(0.0);
        host
    }
}

/// Embeddable document view with optional truncation.
pub struct DocumentHost<R: BlockRenderer> {
    pipeline: TextPipeline<R::Block>,
    bridge: SyncHeightBridge<R>,
}

impl<R: BlockRenderer + 'static> DocumentHost<R> {
    /// Replaces the content. The view collapses and measures from scratch.
    pub fn set_text(&self, text: &str) {
        let document = self.pipeline.document(text);
        self.controller().set_document(document);
    }

    /// Host layout pass at `width`; zero means the host has no width yet.
    pub fn layout_bounds(&self, width: f32) -> f32 {
        self.bridge.layout_bounds(width)
    }

    /// Height that fits `width`.
    pub fn measure(&self, width: f32) -> f32 {
        self.bridge.measure(width)
    }

    pub fn current_height(&self) -> Option<f32> {
        self.bridge.size_report()
    }

    pub fn toggle(&self) {
        self.controller().toggle();
    }

    pub fn is_expanded(&self) -> bool {
        self.controller().is_expanded()
    }

    /// Whether a toggle control is shown at all.
    pub fn has_toggle(&self) -> bool {
        self.controller().config().line_limit.is_limited()
    }

    pub fn set_on_height_change(&self, callback: impl Fn(f32) + 'static) {
        self.bridge.set_on_height_change(callback);
    }

    pub fn handle(&self) -> BridgeHandle {
        self.bridge.handle()
    }

    pub fn controller(&self) -> &ExpandableController<R> {
        self.bridge.controller()
    }

    pub fn bridge(&self) -> &SyncHeightBridge<R> {
        &self.bridge
    }
}

impl<R: BlockRenderer> std::fmt::Debug for DocumentHost<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHost")
            .field("bridge", &self.bridge)
            .finish()
    }
}
