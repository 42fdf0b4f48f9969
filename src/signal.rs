//! Observable state cells with deterministic unsubscription
//!
//! A `Signal<T>` holds a value and notifies subscribers synchronously when
//! the value actually changes. Subscriptions are explicit disposers:
//! dropping (or `dispose()`-ing) one detaches the callback immediately,
//! never relying on garbage collection. This is the publish/subscribe seam
//! between declarative UI state and the imperative audio backend.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Box<dyn FnMut(&T)>;

struct SignalInner<T> {
    value: T,
    subscribers: Vec<(u64, Callback<T>)>,
    next_id: u64,
    /// Ids disposed while the subscriber list was checked out for a
    /// notification pass
    retired: Vec<u64>,
    notifying: bool,
}

/// Observable value cell. Cloning shares the underlying cell.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                subscribers: Vec::new(),
                next_id: 0,
                retired: Vec::new(),
                notifying: false,
            })),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Store a new value and synchronously notify subscribers, in
    /// subscription order, if (and only if) it differs from the current
    /// one. A write from inside a notification updates the value without
    /// starting a nested notification pass.
    pub fn set(&self, value: T) {
        let mut checked_out = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value.clone();
            if inner.notifying {
                return;
            }
            inner.notifying = true;
            std::mem::take(&mut inner.subscribers)
        };

        for (id, callback) in checked_out.iter_mut() {
            let retired = self.inner.borrow().retired.contains(id);
            if !retired {
                callback(&value);
            }
        }

        let mut inner = self.inner.borrow_mut();
        // Subscribers added during the pass live in inner.subscribers;
        // keep them after the originals so ordering stays stable
        let added = std::mem::take(&mut inner.subscribers);
        checked_out.extend(added);
        let retired = std::mem::take(&mut inner.retired);
        checked_out.retain(|(id, _)| !retired.contains(id));
        inner.subscribers = checked_out;
        inner.notifying = false;
    }

    /// Attach a change callback. The returned disposer detaches it; the
    /// callback is never invoked for the current value, only for changes.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Box::new(callback)));
            id
        };

        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut inner = inner.borrow_mut();
                    if inner.notifying {
                        inner.retired.push(id);
                    } else {
                        inner.subscribers.retain(|(sid, _)| *sid != id);
                    }
                }
            })),
        }
    }

    /// Number of live subscribers (subscriptions not yet disposed)
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// Disposer for one subscription. Detaches on `dispose()` or on drop.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Explicitly detach the callback
    pub fn dispose(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_synchronously_on_change() {
        let signal = Signal::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v| sink.borrow_mut().push(*v));

        signal.set(1);
        // Delivery happened within the same tick as the write
        assert_eq!(*seen.borrow(), vec![1]);
        signal.set(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn equal_writes_do_not_notify() {
        let signal = Signal::new(5);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let _sub = signal.subscribe(move |_| *sink.borrow_mut() += 1);

        signal.set(5);
        signal.set(5);
        assert_eq!(*count.borrow(), 0);
        signal.set(6);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn disposed_subscription_stops_firing() {
        let signal = Signal::new(0);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let sub = signal.subscribe(move |_| *sink.borrow_mut() += 1);

        signal.set(1);
        sub.dispose();
        signal.set(2);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let signal = Signal::new(0);
        let count = Rc::new(RefCell::new(0));
        {
            let sink = Rc::clone(&count);
            let _sub = signal.subscribe(move |_| *sink.borrow_mut() += 1);
            signal.set(1);
        }
        signal.set(2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn dispose_during_notification_is_safe() {
        let signal: Signal<i32> = Signal::new(0);
        let holder: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(RefCell::new(0));

        let holder_clone = Rc::clone(&holder);
        let sink = Rc::clone(&count);
        let sub = signal.subscribe(move |_| {
            *sink.borrow_mut() += 1;
            // Dispose ourselves mid-notification
            if let Some(sub) = holder_clone.borrow_mut().take() {
                sub.dispose();
            }
        });
        *holder.borrow_mut() = Some(sub);

        signal.set(1);
        signal.set(2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn subscribe_during_notification_takes_effect_next_change() {
        let signal = Signal::new(0);
        let late_count = Rc::new(RefCell::new(0));
        let holder: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let sig = signal.clone();
        let holder_clone = Rc::clone(&holder);
        let late = Rc::clone(&late_count);
        let _sub = signal.subscribe(move |_| {
            let sink = Rc::clone(&late);
            let new_sub = sig.subscribe(move |_| *sink.borrow_mut() += 1);
            holder_clone.borrow_mut().push(new_sub);
        });

        signal.set(1);
        assert_eq!(*late_count.borrow(), 0);
        signal.set(2);
        assert_eq!(*late_count.borrow(), 1);
    }
}
