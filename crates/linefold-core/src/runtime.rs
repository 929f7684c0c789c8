use crate::collections::map::HashMap;
use crate::platform::RuntimeScheduler;
use crate::DispatchError;
use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::ThreadId;
use std::time::Duration;

/// Identifier of a callback registered on the owner thread with
/// [`RuntimeHandle::register_ui_endpoint`].
pub type EndpointId = u64;

type Payload = Box<dyn Any + Send>;
type UiEndpoint = Rc<dyn Fn(Payload) -> Option<Payload>>;

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Runtime`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl RuntimeId {
    fn next() -> Self {
        Self(NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

enum UiMessage {
    Task(Box<dyn FnOnce() + Send + 'static>),
    Invoke {
        id: EndpointId,
        value: Payload,
        reply: Option<mpsc::SyncSender<Payload>>,
    },
}

struct UiDispatcherInner {
    runtime_id: RuntimeId,
    ui_thread_id: ThreadId,
    scheduler: Arc<dyn RuntimeScheduler>,
    tx: mpsc::Sender<UiMessage>,
    pending: AtomicUsize,
}

impl UiDispatcherInner {
    fn new(
        runtime_id: RuntimeId,
        ui_thread_id: ThreadId,
        scheduler: Arc<dyn RuntimeScheduler>,
        tx: mpsc::Sender<UiMessage>,
    ) -> Self {
        Self {
            runtime_id,
            ui_thread_id,
            scheduler,
            tx,
            pending: AtomicUsize::new(0),
        }
    }

    /// Queues `message` for the owner thread. Returns false once the runtime
    /// has been dropped and its receiver is gone.
    fn send(&self, message: UiMessage) -> bool {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(message).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        self.scheduler.schedule_frame();
        true
    }

    fn has_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }
}

struct PendingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        Self { counter }
    }
}

impl<'a> Drop for PendingGuard<'a> {
    fn drop(&mut self) {
        let previous = self.counter.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "UI dispatcher pending count underflowed");
    }
}

/// Thread-safe entry point into a [`Runtime`].
///
/// Everything posted through the dispatcher runs on the runtime's owner
/// thread the next time it drains. `call` additionally blocks the calling
/// thread until the owner thread has produced a reply.
#[derive(Clone)]
pub struct UiDispatcher {
    inner: Arc<UiDispatcherInner>,
}

impl UiDispatcher {
    fn new(inner: Arc<UiDispatcherInner>) -> Self {
        Self { inner }
    }

    /// Posts a task to run on the owner thread.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.inner.send(UiMessage::Task(Box::new(task)))
    }

    /// Delivers `value` to endpoint `id` without waiting for it to run.
    pub fn send<T>(&self, id: EndpointId, value: T) -> bool
    where
        T: Send + 'static,
    {
        self.inner.send(UiMessage::Invoke {
            id,
            value: Box::new(value),
            reply: None,
        })
    }

    /// Invokes endpoint `id` with `value` on the owner thread and waits for
    /// its return value.
    ///
    /// On the owner thread the endpoint runs inline, so this never deadlocks
    /// against the caller's own drain loop. Elsewhere the caller blocks until
    /// the owner thread drains, the request is dropped unanswered, or
    /// `timeout` elapses.
    pub fn call<T, R>(
        &self,
        id: EndpointId,
        value: T,
        timeout: Option<Duration>,
    ) -> Result<R, DispatchError>
    where
        T: Send + 'static,
        R: Send + 'static,
    {
        let reply = if self.is_ui_thread() {
            let inner = lookup_runtime(self.inner.runtime_id).ok_or(DispatchError::RuntimeDropped)?;
            inner
                .invoke_endpoint(id, Box::new(value))
                .ok_or(DispatchError::Unanswered)?
        } else {
            let (reply_tx, reply_rx) = mpsc::sync_channel(1);
            let delivered = self.inner.send(UiMessage::Invoke {
                id,
                value: Box::new(value),
                reply: Some(reply_tx),
            });
            if !delivered {
                return Err(DispatchError::RuntimeDropped);
            }
            match timeout {
                Some(timeout) => reply_rx.recv_timeout(timeout).map_err(|err| match err {
                    mpsc::RecvTimeoutError::Timeout => DispatchError::Timeout,
                    mpsc::RecvTimeoutError::Disconnected => DispatchError::Unanswered,
                })?,
                None => reply_rx.recv().map_err(|_| DispatchError::Unanswered)?,
            }
        };
        reply
            .downcast::<R>()
            .map(|boxed| *boxed)
            .map_err(|_| DispatchError::ReplyMismatch {
                expected: type_name::<R>(),
            })
    }

    pub fn has_pending(&self) -> bool {
        self.inner.has_pending()
    }

    /// Returns true when called from the runtime's owner thread.
    pub fn is_ui_thread(&self) -> bool {
        std::thread::current().id() == self.inner.ui_thread_id
    }

    pub fn runtime_id(&self) -> RuntimeId {
        self.inner.runtime_id
    }
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("runtime_id", &self.inner.runtime_id)
            .field("pending", &self.inner.pending.load(Ordering::SeqCst))
            .finish()
    }
}

struct RuntimeInner {
    id: RuntimeId,
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    ui_dispatcher: Arc<UiDispatcherInner>,
    ui_rx: RefCell<mpsc::Receiver<UiMessage>>,
    local_tasks: RefCell<VecDeque<Box<dyn FnOnce() + 'static>>>,
    endpoints: RefCell<HashMap<EndpointId, UiEndpoint>>,
    next_endpoint_id: Cell<EndpointId>,
    ui_thread_id: ThreadId,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let id = RuntimeId::next();
        let ui_thread_id = std::thread::current().id();
        let (tx, rx) = mpsc::channel();
        let dispatcher = Arc::new(UiDispatcherInner::new(
            id,
            ui_thread_id,
            scheduler.clone(),
            tx,
        ));
        Self {
            id,
            scheduler,
            needs_frame: Cell::new(false),
            ui_dispatcher: dispatcher,
            ui_rx: RefCell::new(rx),
            local_tasks: RefCell::new(VecDeque::new()),
            endpoints: RefCell::new(HashMap::default()),
            next_endpoint_id: Cell::new(1),
            ui_thread_id,
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    /// Queues a closure on the owner thread's local queue.
    ///
    /// The closure may capture `Rc`/`RefCell` values because it never leaves
    /// the owner thread. Callers must only invoke this from the owner thread.
    fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        debug_assert_eq!(
            std::thread::current().id(),
            self.ui_thread_id,
            "UI task enqueued off the owner thread",
        );
        self.local_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn register_ui_endpoint(&self, endpoint: UiEndpoint) -> EndpointId {
        debug_assert_eq!(
            std::thread::current().id(),
            self.ui_thread_id,
            "UI endpoint registered off the owner thread",
        );
        let id = self.next_endpoint_id.get();
        self.next_endpoint_id.set(id + 1);
        self.endpoints.borrow_mut().insert(id, endpoint);
        id
    }

    fn cancel_ui_endpoint(&self, id: EndpointId) -> bool {
        self.endpoints.borrow_mut().remove(&id).is_some()
    }

    fn invoke_endpoint(&self, id: EndpointId, value: Payload) -> Option<Payload> {
        let endpoint = self.endpoints.borrow().get(&id).cloned();
        match endpoint {
            Some(endpoint) => endpoint(value),
            None => {
                log::debug!("dropping message for cancelled endpoint {id}");
                None
            }
        }
    }

    fn drain_ui(&self) {
        loop {
            let mut executed = false;

            loop {
                // Release the receiver borrow before running anything: tasks
                // may post again or call back into the runtime.
                let message = self.ui_rx.borrow().try_recv().ok();
                let Some(message) = message else {
                    break;
                };
                executed = true;
                let _guard = PendingGuard::new(&self.ui_dispatcher.pending);
                match message {
                    UiMessage::Task(task) => task(),
                    UiMessage::Invoke { id, value, reply } => {
                        let result = self.invoke_endpoint(id, value);
                        if let (Some(reply), Some(result)) = (reply, result) {
                            let _ = reply.send(result);
                        }
                    }
                }
            }

            loop {
                let task = self.local_tasks.borrow_mut().pop_front();
                match task {
                    Some(task) => {
                        executed = true;
                        task();
                    }
                    None => break,
                }
            }

            if !executed {
                break;
            }
        }
        if !self.has_pending_ui() {
            self.needs_frame.set(false);
        }
    }

    fn has_pending_ui(&self) -> bool {
        let local_pending = self
            .local_tasks
            .try_borrow()
            .map(|tasks| !tasks.is_empty())
            .unwrap_or(true);
        local_pending || self.ui_dispatcher.has_pending()
    }
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        let id = self.id;
        let _ = RUNTIMES.try_with(|runtimes| {
            if let Ok(mut runtimes) = runtimes.try_borrow_mut() {
                runtimes.remove(&id);
            }
        });
    }
}

/// Single-threaded owner of all engine state mutation.
///
/// The thread that creates a `Runtime` becomes its owner thread. Other
/// threads reach it only through [`UiDispatcher`].
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let inner = Rc::new(RuntimeInner::new(scheduler));
        RUNTIMES.with(|runtimes| {
            runtimes
                .borrow_mut()
                .insert(inner.id, Rc::downgrade(&inner));
        });
        Self { inner }
    }

    pub fn id(&self) -> RuntimeId {
        self.inner.id
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
            dispatcher: UiDispatcher::new(self.inner.ui_dispatcher.clone()),
            ui_thread_id: self.inner.ui_thread_id,
        }
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get() || self.inner.has_pending_ui()
    }

    /// Runs every queued task and endpoint invocation, including work queued
    /// while draining.
    pub fn drain_ui(&self) {
        self.inner.drain_ui();
    }

    pub fn dispatcher(&self) -> UiDispatcher {
        UiDispatcher::new(self.inner.ui_dispatcher.clone())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.inner.id)
            .field("needs_frame", &self.inner.needs_frame.get())
            .finish()
    }
}

/// Weak, owner-thread-only handle to a [`Runtime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
    dispatcher: UiDispatcher,
    ui_thread_id: ThreadId,
}

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Schedules work that must run on the owner thread.
    ///
    /// The task runs the next time the runtime drains, so it may capture
    /// `Rc`/`RefCell` values. If the runtime is already gone the task runs
    /// immediately.
    pub fn enqueue_ui_task(&self, task: Box<dyn FnOnce() + 'static>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.enqueue_ui_task(task);
        } else {
            task();
        }
    }

    /// Registers `f` as a long-lived endpoint that other threads can invoke
    /// through [`UiDispatcher::send`] and [`UiDispatcher::call`].
    ///
    /// Returns `None` when the runtime has already been dropped.
    pub fn register_ui_endpoint<T, R>(&self, f: impl Fn(T) -> R + 'static) -> Option<EndpointId>
    where
        T: Send + 'static,
        R: Send + 'static,
    {
        let inner = self.inner.upgrade()?;
        let endpoint: UiEndpoint = Rc::new(move |value: Payload| match value.downcast::<T>() {
            Ok(value) => Some(Box::new(f(*value)) as Payload),
            Err(_) => {
                log::warn!(
                    "UI endpoint expected {} but received another payload type",
                    type_name::<T>()
                );
                None
            }
        });
        Some(inner.register_ui_endpoint(endpoint))
    }

    /// Removes an endpoint. Requests already queued for it are dropped
    /// unanswered when the runtime drains.
    pub fn cancel_ui_endpoint(&self, id: EndpointId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.cancel_ui_endpoint(id))
            .unwrap_or(false)
    }

    pub fn drain_ui(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_ui();
        }
    }

    pub fn has_pending_ui(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_pending_ui())
            .unwrap_or_else(|| self.dispatcher.has_pending())
    }

    pub fn is_ui_thread(&self) -> bool {
        std::thread::current().id() == self.ui_thread_id
    }

    pub fn assert_ui_thread(&self) {
        debug_assert_eq!(
            std::thread::current().id(),
            self.ui_thread_id,
            "state mutated off the runtime's owner thread"
        );
    }

    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }
}

thread_local! {
    static RUNTIMES: RefCell<HashMap<RuntimeId, Weak<RuntimeInner>>> = RefCell::new(HashMap::default());
}

fn lookup_runtime(id: RuntimeId) -> Option<Rc<RuntimeInner>> {
    RUNTIMES
        .try_with(|runtimes| runtimes.borrow().get(&id).and_then(Weak::upgrade))
        .ok()
        .flatten()
}
