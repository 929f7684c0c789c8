//! Expand/collapse orchestration.
//!
//! The controller owns one document's measurement store and expansion
//! state, turns them into a [`VisibilityPlan`], and drives the renderer
//! through the visible and shadow passes when the host lays it out.

use crate::config::ExpandableConfig;
use crate::renderer::{BlockRenderer, RenderDirective, RenderPass};
use linefold_core::{EndpointId, Listeners, RuntimeHandle, Subscription};
use linefold_foundation::{
    allocate, shadow_pass_active, Document, MeasurementReporter, MeasurementSnapshot,
    MeasurementStore, MergeOutcome, ReportWake, ShadowPass, VisibilityPlan,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct ControllerInner<R: BlockRenderer> {
    this: Weak<ControllerInner<R>>,
    runtime: RuntimeHandle,
    config: ExpandableConfig,
    renderer: RefCell<R>,
    document: RefCell<Rc<Document<R::Block>>>,
    store: RefCell<MeasurementStore>,
    expanded: Cell<bool>,
    plan: RefCell<VisibilityPlan>,
    reporter: RefCell<MeasurementReporter>,
    endpoint: Option<EndpointId>,
    last_width: Cell<Option<f32>>,
    last_height: Cell<Option<f32>>,
    /// The last shadow pass stopped before visiting every block.
    shadow_unfinished: Cell<bool>,
    shadow_resume_queued: Cell<bool>,
    expanded_listeners: Listeners<bool>,
    plan_listeners: Listeners<VisibilityPlan>,
    size_listeners: Listeners<f32>,
    invalidation_listeners: Listeners<()>,
}

impl<R: BlockRenderer + 'static> ControllerInner<R> {
    fn generation(&self) -> u64 {
        self.document.borrow().generation()
    }

    fn on_report_wake(&self, wake: ReportWake) {
        if wake.generation != self.generation() {
            log::trace!(
                "dropping measurement batch for stale generation {}",
                wake.generation
            );
            return;
        }
        let batch = self.reporter.borrow().take_batch();
        self.apply_measurements(batch.iter());
    }

    fn apply_measurements(&self, partial: impl IntoIterator<Item = (usize, usize)>) -> MergeOutcome {
        let outcome = self.store.borrow_mut().merge(partial);
        if outcome.changed && self.recompute_plan() {
            self.invalidate();
        }
        if outcome.changed && self.shadow_unfinished.get() && !self.store.borrow().is_ready() {
            self.schedule_shadow_resume();
        }
        outcome
    }

    fn schedule_shadow_resume(&self) {
        if self.shadow_resume_queued.replace(true) {
            return;
        }
        let weak = self.this.clone();
        self.runtime.enqueue_ui_task(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.shadow_resume_queued.set(false);
                inner.resume_shadow_pass();
            }
        }));
    }

    /// Picks up an interrupted shadow pass at the last laid-out width.
    fn resume_shadow_pass(&self) {
        if !self.shadow_unfinished.get() || self.store.borrow().is_ready() {
            return;
        }
        let Some(width) = self.last_width.get() else {
            return;
        };
        let document = self.document.borrow().clone();
        let reporter = self.reporter.borrow().clone();
        let Ok(mut renderer) = self.renderer.try_borrow_mut() else {
            return;
        };
        log::trace!("resuming shadow pass for document {}", document.generation());
        let exhausted = self.run_shadow_pass(&mut renderer, &document, &reporter, width);
        self.shadow_unfinished.set(exhausted);
    }

    /// Returns whether the pass stopped before visiting every block.
    fn run_shadow_pass(
        &self,
        renderer: &mut R,
        document: &Document<R::Block>,
        reporter: &MeasurementReporter,
        width: f32,
    ) -> bool {
        let snapshot = self.store.borrow().snapshot();
        let mut render = |index: usize, line_cap: usize| {
            if let Some(content) = document.get(index) {
                let directive = RenderDirective {
                    block_index: index,
                    line_cap: Some(line_cap),
                    width,
                    pass: RenderPass::Shadow,
                };
                renderer.render_block(content, &directive, reporter);
            }
        };
        ShadowPass::new(&mut render, &self.config.shadow)
            .run(document.len(), &snapshot)
            .exhausted
    }

    /// Recomputes the plan and publishes it if it differs from the current
    /// one. Returns whether it changed.
    fn recompute_plan(&self) -> bool {
        let plan = {
            let store = self.store.borrow();
            allocate(
                store.total_blocks(),
                self.config.line_limit.budget(),
                self.expanded.get(),
                store.measurements(),
            )
        };
        if *self.plan.borrow() == plan {
            return false;
        }
        log::trace!("visibility plan changed: {:?}", plan);
        *self.plan.borrow_mut() = plan.clone();
        self.plan_listeners.notify(&plan);
        true
    }

    fn invalidate(&self) {
        self.invalidation_listeners.notify(&());
    }

    fn layout(&self, width: f32) -> f32 {
        let document = self.document.borrow().clone();
        let plan = self.plan.borrow().clone();
        let reporter = self.reporter.borrow().clone();
        let expanded = self.expanded.get();
        let Ok(mut renderer) = self.renderer.try_borrow_mut() else {
            log::warn!("ignoring layout requested from inside a render");
            return self.last_height.get().unwrap_or(0.0);
        };

        let spacing = self.config.block_spacing;
        let mut height = 0.0f32;
        for (position, block) in plan.iter().enumerate() {
            let Some(content) = document.get(block.index) else {
                continue;
            };
            if position > 0 {
                height += spacing;
            }
            let directive = RenderDirective {
                block_index: block.index,
                line_cap: block.line_cap,
                width,
                pass: RenderPass::Visible,
            };
            height += sanitize_height(renderer.render_block(content, &directive, &reporter));
        }

        if let Some(label) = self.config.toggle_label(expanded) {
            if !plan.is_empty() {
                height += spacing;
            }
            height += sanitize_height(renderer.render_toggle(label, width));
        }

        let ready = self.store.borrow().is_ready();
        let unfinished = self.config.line_limit.is_limited()
            && !document.is_empty()
            && shadow_pass_active(ready, expanded)
            && self.run_shadow_pass(&mut renderer, &document, &reporter, width);
        self.shadow_unfinished.set(unfinished);
        drop(renderer);

        self.last_width.set(Some(width));
        if self.last_height.get() != Some(height) {
            self.last_height.set(Some(height));
            log::debug!(
                "document {} laid out at width {width}: height {height}",
                document.generation()
            );
            self.size_listeners.notify(&height);
        }
        height
    }
}

impl<R: BlockRenderer> Drop for ControllerInner<R> {
    fn drop(&mut self) {
        if let Some(endpoint) = self.endpoint {
            self.runtime.cancel_ui_endpoint(endpoint);
        }
    }
}

fn sanitize_height(height: f32) -> f32 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}

fn make_reporter(
    runtime: &RuntimeHandle,
    endpoint: Option<EndpointId>,
    generation: u64,
) -> MeasurementReporter {
    match endpoint {
        Some(endpoint) => MeasurementReporter::new(runtime.dispatcher(), endpoint, generation),
        None => MeasurementReporter::buffered(generation),
    }
}

/// Collapsed/expanded presentation of one document.
///
/// Cloning yields another handle to the same controller. All methods must
/// be called on the runtime's owner thread.
pub struct ExpandableController<R: BlockRenderer> {
    inner: Rc<ControllerInner<R>>,
}

impl<R: BlockRenderer + 'static> ExpandableController<R> {
    /// Creates a collapsed controller for `document`.
    ///
    /// Measurement reports from `renderer` are merged when `runtime` drains.
    /// If the runtime is already gone, reports are only buffered and can be
    /// applied with [`flush_measurements`](Self::flush_measurements).
    pub fn new(
        runtime: RuntimeHandle,
        renderer: R,
        document: Document<R::Block>,
        config: ExpandableConfig,
    ) -> Self {
        runtime.assert_ui_thread();
        let inner = Rc::new_cyclic(|weak: &Weak<ControllerInner<R>>| {
            let this = weak.clone();
            let endpoint = {
                let weak = weak.clone();
                runtime.register_ui_endpoint(move |wake: ReportWake| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_report_wake(wake);
                    }
                })
            };
            if endpoint.is_none() {
                log::warn!("runtime dropped; measurements will only be buffered");
            }
            let store = MeasurementStore::new(document.len());
            let plan = allocate(
                document.len(),
                config.line_limit.budget(),
                false,
                store.measurements(),
            );
            ControllerInner {
                this,
                reporter: RefCell::new(make_reporter(&runtime, endpoint, document.generation())),
                runtime,
                config,
                renderer: RefCell::new(renderer),
                document: RefCell::new(Rc::new(document)),
                store: RefCell::new(store),
                expanded: Cell::new(false),
                plan: RefCell::new(plan),
                endpoint,
                last_width: Cell::new(None),
                last_height: Cell::new(None),
                shadow_unfinished: Cell::new(false),
                shadow_resume_queued: Cell::new(false),
                expanded_listeners: Listeners::new(),
                plan_listeners: Listeners::new(),
                size_listeners: Listeners::new(),
                invalidation_listeners: Listeners::new(),
            }
        });
        Self { inner }
    }

    pub fn config(&self) -> &ExpandableConfig {
        &self.inner.config
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.inner.runtime.clone()
    }

    pub fn is_expanded(&self) -> bool {
        self.inner.expanded.get()
    }

    /// Flips between collapsed and expanded.
    pub fn toggle(&self) {
        let inner = &self.inner;
        let expanded = !inner.expanded.get();
        inner.expanded.set(expanded);
        log::debug!(
            "document {} {}",
            inner.generation(),
            if expanded { "expanded" } else { "collapsed" }
        );
        inner.recompute_plan();
        inner.expanded_listeners.notify(&expanded);
        inner.invalidate();
    }

    /// Replaces the document. Measurements are discarded and the controller
    /// collapses again.
    pub fn set_document(&self, document: Document<R::Block>) {
        let inner = &self.inner;
        let generation = document.generation();
        let total_blocks = document.len();
        *inner.document.borrow_mut() = Rc::new(document);
        inner.store.borrow_mut().reset(total_blocks);
        inner.shadow_unfinished.set(false);
        let was_expanded = inner.expanded.replace(false);
        *inner.reporter.borrow_mut() = make_reporter(&inner.runtime, inner.endpoint, generation);
        log::debug!("document {generation} installed with {total_blocks} blocks");
        inner.recompute_plan();
        if was_expanded {
            inner.expanded_listeners.notify(&false);
        }
        inner.invalidate();
    }

    pub fn document(&self) -> Rc<Document<R::Block>> {
        self.inner.document.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation()
    }

    pub fn total_blocks(&self) -> usize {
        self.inner.store.borrow().total_blocks()
    }

    pub fn plan(&self) -> VisibilityPlan {
        self.inner.plan.borrow().clone()
    }

    pub fn measurements(&self) -> MeasurementSnapshot {
        self.inner.store.borrow().snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.store.borrow().is_ready()
    }

    /// Label of the toggle control, or `None` when truncation is off.
    pub fn toggle_label(&self) -> Option<&str> {
        self.inner.config.toggle_label(self.is_expanded())
    }

    /// Reporter for the current document. Renderers that finish layout later
    /// may keep a clone and report from any thread.
    pub fn reporter(&self) -> MeasurementReporter {
        self.inner.reporter.borrow().clone()
    }

    /// Merges measurements directly on the owner thread.
    pub fn apply_measurements(
        &self,
        partial: impl IntoIterator<Item = (usize, usize)>,
    ) -> MergeOutcome {
        self.inner.apply_measurements(partial)
    }

    /// Merges whatever the current reporter has buffered.
    pub fn flush_measurements(&self) -> MergeOutcome {
        let batch = self.inner.reporter.borrow().take_batch();
        self.inner.apply_measurements(batch.iter())
    }

    /// Renders the plan at `width` and returns the aggregate height.
    ///
    /// Blocks are stacked with the configured spacing, followed by the
    /// toggle control when truncation is on. While measurements are
    /// incomplete, or while expanded, the shadow pass runs afterwards.
    pub fn layout(&self, width: f32) -> f32 {
        self.inner.layout(width)
    }

    pub fn last_height(&self) -> Option<f32> {
        self.inner.last_height.get()
    }

    pub fn last_width(&self) -> Option<f32> {
        self.inner.last_width.get()
    }

    /// Called with the new expansion flag whenever it changes.
    pub fn subscribe_expanded(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.expanded_listeners.subscribe(listener)
    }

    /// Called with the new plan whenever it changes.
    pub fn subscribe_plan(&self, listener: impl Fn(&VisibilityPlan) + 'static) -> Subscription {
        self.inner.plan_listeners.subscribe(listener)
    }

    /// Called with the new height whenever a layout produces a different
    /// aggregate height.
    pub fn subscribe_size(&self, listener: impl Fn(&f32) + 'static) -> Subscription {
        self.inner.size_listeners.subscribe(listener)
    }

    /// Called whenever the laid-out size may have changed and the host
    /// should lay out again: on toggle, on a new document and on a new
    /// plan.
    pub fn subscribe_invalidation(&self, listener: impl Fn() + 'static) -> Subscription {
        self.inner.invalidation_listeners.subscribe(move |_: &()| listener())
    }
}

impl<R: BlockRenderer> Clone for ExpandableController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: BlockRenderer> std::fmt::Debug for ExpandableController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandableController")
            .field("expanded", &self.inner.expanded.get())
            .field("plan", &*self.inner.plan.borrow())
            .field("last_height", &self.inner.last_height.get())
            .finish()
    }
}
