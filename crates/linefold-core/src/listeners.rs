//! Explicit observer registry.
//!
//! Owners call [`Listeners::notify`] after a state change that observers
//! care about. Whether a change happened is the owner's decision; the
//! registry itself never compares values.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct ListenersInner<T: ?Sized> {
    next_id: u64,
    entries: IndexMap<u64, Listener<T>>,
}

/// Ordered set of owner-thread callbacks.
///
/// Listeners run in subscription order. Subscribing or unsubscribing from
/// inside a callback is allowed; the change takes effect on the next
/// notification.
pub struct Listeners<T: ?Sized> {
    inner: Rc<RefCell<ListenersInner<T>>>,
}

impl<T: ?Sized + 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenersInner {
                next_id: 1,
                entries: IndexMap::new(),
            })),
        }
    }

    /// Registers `listener`. It stays registered until the returned
    /// [`Subscription`] is dropped or cancelled.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.insert(id, Rc::new(listener));
            id
        };
        let weak: Weak<RefCell<ListenersInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.shift_remove(&id);
            }
        })
    }

    pub fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self.inner.borrow().entries.values().cloned().collect();
        for listener in listeners {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Leaves the listener registered for the lifetime of its registry.
    pub fn detach(mut self) {
        self.cancel.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
