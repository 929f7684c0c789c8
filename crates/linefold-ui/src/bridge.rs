//! Synchronous height queries for imperative hosts.
//!
//! A host such as a virtualized list needs a pixel height before it can
//! place a cell, while the controller only learns its true size after
//! measurements arrive. [`SyncHeightBridge`] answers "how tall at this
//! width, now" on the owner thread and [`BridgeHandle`] forwards the same
//! question from any other thread.

use crate::config::BridgeConfig;
use crate::controller::ExpandableController;
use crate::renderer::BlockRenderer;
use linefold_core::{EndpointId, RuntimeHandle, Subscription, UiDispatcher};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// State readable from any thread.
struct BridgeShared {
    cached_height: Mutex<Option<f32>>,
    alive: AtomicBool,
}

impl BridgeShared {
    fn cached_height(&self) -> Option<f32> {
        *self
            .cached_height
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, height: f32) {
        *self
            .cached_height
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(height);
    }
}

struct BridgeInner<R: BlockRenderer> {
    controller: ExpandableController<R>,
    runtime: RuntimeHandle,
    config: BridgeConfig,
    shared: Arc<BridgeShared>,
    size_report: Cell<Option<f32>>,
    last_width: Cell<Option<f32>>,
    on_height_change: RefCell<Option<Rc<dyn Fn(f32)>>>,
    callback_queued: Cell<bool>,
    relayout_queued: Cell<bool>,
    endpoint: Option<EndpointId>,
    invalidation: RefCell<Option<Subscription>>,
}

impl<R: BlockRenderer + 'static> BridgeInner<R> {
    fn effective_width(&self, width: f32) -> f32 {
        if width.is_finite() && width > 0.0 {
            width
        } else {
            self.config.fallback_width
        }
    }

    /// Lays out at `width` and rounds up. A non-positive result falls back
    /// to the cached height.
    fn fit(&self, width: f32) -> f32 {
        let height = self.controller.layout(width);
        if height > 0.0 {
            height.ceil()
        } else {
            self.size_report.get().unwrap_or(0.0)
        }
    }

    fn store_report(&self, height: f32) {
        if height <= 0.0 {
            return;
        }
        self.size_report.set(Some(height));
        self.shared.store(height);
    }

    fn measure(&self, width: f32) -> f32 {
        let width = self.effective_width(width);
        self.last_width.set(Some(width));
        let height = self.fit(width);
        self.store_report(height);
        height
    }

    fn layout_bounds(this: &Rc<Self>, width: f32) -> f32 {
        let width = this.effective_width(width);
        this.last_width.set(Some(width));
        let height = this.fit(width);
        Self::update_height(this, height);
        height
    }

    fn update_height(this: &Rc<Self>, height: f32) {
        if height <= 0.0 || this.size_report.get() == Some(height) {
            return;
        }
        log::debug!(
            "height changed from {:?} to {height}",
            this.size_report.get()
        );
        this.store_report(height);
        Self::schedule_callback(this);
    }

    fn schedule_callback(this: &Rc<Self>) {
        if this.callback_queued.replace(true) {
            return;
        }
        let weak = Rc::downgrade(this);
        this.runtime.enqueue_ui_task(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.callback_queued.set(false);
            let callback = inner.on_height_change.borrow().clone();
            if let (Some(callback), Some(height)) = (callback, inner.size_report.get()) {
                callback(height);
            }
        }));
    }

    fn schedule_relayout(this: &Rc<Self>) {
        if this.relayout_queued.replace(true) {
            return;
        }
        let weak = Rc::downgrade(this);
        this.runtime.enqueue_ui_task(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.relayout_queued.set(false);
                Self::relayout(&inner);
            }
        }));
    }

    fn relayout(this: &Rc<Self>) {
        let Some(width) = this.last_width.get() else {
            return;
        };
        let height = this.fit(width);
        Self::update_height(this, height);
    }
}

impl<R: BlockRenderer> Drop for BridgeInner<R> {
    fn drop(&mut self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        if let Some(endpoint) = self.endpoint {
            self.runtime.cancel_ui_endpoint(endpoint);
        }
    }
}

/// Owner-thread bridge between a controller and an imperative host.
///
/// The bridge keeps the last height it handed out (the size report). When
/// the controller invalidates on its own, after a toggle or once new
/// measurements change the plan, the bridge lays out again at the last
/// width and, if the height moved, tells the host through the height-change
/// callback. The callback always runs as a separate owner-thread task and
/// sees the latest height at that point.
pub struct SyncHeightBridge<R: BlockRenderer> {
    inner: Rc<BridgeInner<R>>,
}

impl<R: BlockRenderer + 'static> SyncHeightBridge<R> {
    pub fn new(controller: ExpandableController<R>, config: BridgeConfig) -> Self {
        let runtime = controller.runtime_handle();
        let shared = Arc::new(BridgeShared {
            cached_height: Mutex::new(None),
            alive: AtomicBool::new(true),
        });
        let inner = Rc::new_cyclic(|weak: &Weak<BridgeInner<R>>| {
            let endpoint = {
                let weak = weak.clone();
                runtime.register_ui_endpoint(move |width: f32| match weak.upgrade() {
                    Some(inner) => inner.measure(width),
                    None => 0.0,
                })
            };
            BridgeInner {
                controller,
                runtime,
                config,
                shared,
                size_report: Cell::new(None),
                last_width: Cell::new(None),
                on_height_change: RefCell::new(None),
                callback_queued: Cell::new(false),
                relayout_queued: Cell::new(false),
                endpoint,
                invalidation: RefCell::new(None),
            }
        });

        let weak = Rc::downgrade(&inner);
        let invalidation = inner.controller.subscribe_invalidation(move || {
            if let Some(inner) = weak.upgrade() {
                BridgeInner::schedule_relayout(&inner);
            }
        });
        *inner.invalidation.borrow_mut() = Some(invalidation);
        Self { inner }
    }

    pub fn controller(&self) -> &ExpandableController<R> {
        &self.inner.controller
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Lays out at `width` with unbounded height and returns the fitted
    /// height, rounded up. The result becomes the size report without
    /// notifying the host, which already has it.
    pub fn measure(&self, width: f32) -> f32 {
        self.inner.measure(width)
    }

    /// Host layout pass: measures at `width` (the fallback width when zero)
    /// and pushes a changed height through the height-change callback.
    pub fn layout_bounds(&self, width: f32) -> f32 {
        BridgeInner::layout_bounds(&self.inner, width)
    }

    /// Last height handed to the host.
    pub fn size_report(&self) -> Option<f32> {
        self.inner.size_report.get()
    }

    pub fn set_on_height_change(&self, callback: impl Fn(f32) + 'static) {
        self.set_on_height_change_rc(Rc::new(callback));
    }

    pub(crate) fn set_on_height_change_rc(&self, callback: Rc<dyn Fn(f32)>) {
        *self.inner.on_height_change.borrow_mut() = Some(callback);
    }

    pub fn clear_on_height_change(&self) {
        self.inner.on_height_change.borrow_mut().take();
    }

    /// Thread-safe handle for measuring from other threads.
    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            dispatcher: self.inner.runtime.dispatcher(),
            endpoint: self.inner.endpoint,
            shared: Arc::clone(&self.inner.shared),
            timeout: self.inner.config.sync_timeout,
        }
    }
}

impl<R: BlockRenderer> std::fmt::Debug for SyncHeightBridge<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHeightBridge")
            .field("size_report", &self.inner.size_report.get())
            .field("last_width", &self.inner.last_width.get())
            .finish()
    }
}

/// `Send + Sync` entry point to a [`SyncHeightBridge`].
///
/// [`measure`](Self::measure) runs the bridge's measure on the owner thread
/// and blocks until it answers. On the owner thread itself the call runs
/// inline. If the bridge or its runtime is gone, or the configured timeout
/// elapses, the last cached height is returned instead.
#[derive(Clone)]
pub struct BridgeHandle {
    dispatcher: UiDispatcher,
    endpoint: Option<EndpointId>,
    shared: Arc<BridgeShared>,
    timeout: Option<Duration>,
}

impl BridgeHandle {
    pub fn measure(&self, width: f32) -> f32 {
        let Some(endpoint) = self.endpoint else {
            return self.cached_height();
        };
        if !self.shared.alive.load(Ordering::SeqCst) {
            return self.cached_height();
        }
        match self.dispatcher.call::<f32, f32>(endpoint, width, self.timeout) {
            Ok(height) => height,
            Err(err) => {
                log::debug!("measure fell back to cached height: {err}");
                self.cached_height()
            }
        }
    }

    /// Last height the bridge recorded, or 0 if it never measured.
    pub fn cached_height(&self) -> f32 {
        self.shared.cached_height().unwrap_or(0.0)
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("endpoint", &self.endpoint)
            .field("cached_height", &self.shared.cached_height())
            .finish()
    }
}
